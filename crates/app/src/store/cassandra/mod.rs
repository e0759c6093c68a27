//! Cassandra Executor
//!
//! Every statement is prepared once when the session connects and bound
//! positionally afterwards. All reads are single-partition and unpaged.

use std::fmt;

use async_trait::async_trait;
use jiff::civil::Date;
use promocat::{
    memberships::ProductId,
    promotions::{Promotion, PromotionId},
};
use scylla::{
    client::{
        execution_profile::ExecutionProfile, session::Session, session_builder::SessionBuilder,
    },
    deserialize::row::DeserializeRow,
    policies::load_balancing::DefaultPolicy,
    serialize::row::SerializeRow,
    statement::prepared::PreparedStatement,
};
use tracing::info;

use crate::{
    config::StoreConfig,
    domain::{
        active_days::records::ActiveDay,
        memberships::records::{ProductInPromotion, PromotionForProduct},
        promotions::records::PromotionByType,
    },
    store::{Executor, StoreError},
};

use self::{
    rows::{
        ActiveDayRow, ProductInPromotionRow, PromotionByTypeRow, PromotionForProductRow,
        PromotionRow,
    },
    values::{
        to_cql_date, to_cql_decimal, try_i32_from_u32, try_optional_cql_date,
        try_optional_i32_from_u32,
    },
};

mod rows;
pub mod schema;
mod values;

const SELECT_PROMOTION_CQL: &str = include_str!("cql/select_promotion.cql");
const INSERT_PROMOTION_CQL: &str = include_str!("cql/insert_promotion.cql");
const DELETE_PROMOTION_CQL: &str = include_str!("cql/delete_promotion.cql");
const SELECT_PROMOTIONS_BY_TYPE_CQL: &str = include_str!("cql/select_promotions_by_type.cql");
const SELECT_PRODUCTS_BY_PROMOTION_CQL: &str =
    include_str!("cql/select_products_by_promotion.cql");
const INSERT_PRODUCT_BY_PROMOTION_CQL: &str = include_str!("cql/insert_product_by_promotion.cql");
const DELETE_PRODUCT_BY_PROMOTION_CQL: &str = include_str!("cql/delete_product_by_promotion.cql");
const SELECT_PROMOTIONS_BY_PRODUCT_CQL: &str =
    include_str!("cql/select_promotions_by_product.cql");
const INSERT_PROMOTION_BY_PRODUCT_CQL: &str = include_str!("cql/insert_promotion_by_product.cql");
const DELETE_PROMOTION_BY_PRODUCT_CQL: &str = include_str!("cql/delete_promotion_by_product.cql");
const SELECT_ACTIVE_BY_DAY_CQL: &str = include_str!("cql/select_active_by_day.cql");
const INSERT_ACTIVE_DAY_CQL: &str = include_str!("cql/insert_active_day.cql");
const DELETE_ACTIVE_DAY_CQL: &str = include_str!("cql/delete_active_day.cql");
const RELEASE_VERSION_CQL: &str = include_str!("cql/release_version.cql");

/// A prepared statement and the name reported in errors.
struct Prepared {
    name: &'static str,
    statement: PreparedStatement,
}

impl Prepared {
    async fn new(
        session: &Session,
        name: &'static str,
        cql: &'static str,
    ) -> Result<Self, StoreError> {
        let statement = session
            .prepare(cql)
            .await
            .map_err(|e| StoreError::prepare(name, e))?;

        Ok(Self { name, statement })
    }
}

struct Statements {
    select_promotion: Prepared,
    insert_promotion: Prepared,
    delete_promotion: Prepared,
    select_promotions_by_type: Prepared,
    select_products_by_promotion: Prepared,
    insert_product_by_promotion: Prepared,
    delete_product_by_promotion: Prepared,
    select_promotions_by_product: Prepared,
    insert_promotion_by_product: Prepared,
    delete_promotion_by_product: Prepared,
    select_active_by_day: Prepared,
    insert_active_day: Prepared,
    delete_active_day: Prepared,
    release_version: Prepared,
}

impl Statements {
    async fn prepare(session: &Session) -> Result<Self, StoreError> {
        Ok(Self {
            select_promotion: Prepared::new(session, "select_promotion", SELECT_PROMOTION_CQL)
                .await?,
            insert_promotion: Prepared::new(session, "insert_promotion", INSERT_PROMOTION_CQL)
                .await?,
            delete_promotion: Prepared::new(session, "delete_promotion", DELETE_PROMOTION_CQL)
                .await?,
            select_promotions_by_type: Prepared::new(
                session,
                "select_promotions_by_type",
                SELECT_PROMOTIONS_BY_TYPE_CQL,
            )
            .await?,
            select_products_by_promotion: Prepared::new(
                session,
                "select_products_by_promotion",
                SELECT_PRODUCTS_BY_PROMOTION_CQL,
            )
            .await?,
            insert_product_by_promotion: Prepared::new(
                session,
                "insert_product_by_promotion",
                INSERT_PRODUCT_BY_PROMOTION_CQL,
            )
            .await?,
            delete_product_by_promotion: Prepared::new(
                session,
                "delete_product_by_promotion",
                DELETE_PRODUCT_BY_PROMOTION_CQL,
            )
            .await?,
            select_promotions_by_product: Prepared::new(
                session,
                "select_promotions_by_product",
                SELECT_PROMOTIONS_BY_PRODUCT_CQL,
            )
            .await?,
            insert_promotion_by_product: Prepared::new(
                session,
                "insert_promotion_by_product",
                INSERT_PROMOTION_BY_PRODUCT_CQL,
            )
            .await?,
            delete_promotion_by_product: Prepared::new(
                session,
                "delete_promotion_by_product",
                DELETE_PROMOTION_BY_PRODUCT_CQL,
            )
            .await?,
            select_active_by_day: Prepared::new(
                session,
                "select_active_by_day",
                SELECT_ACTIVE_BY_DAY_CQL,
            )
            .await?,
            insert_active_day: Prepared::new(session, "insert_active_day", INSERT_ACTIVE_DAY_CQL)
                .await?,
            delete_active_day: Prepared::new(session, "delete_active_day", DELETE_ACTIVE_DAY_CQL)
                .await?,
            release_version: Prepared::new(session, "release_version", RELEASE_VERSION_CQL)
                .await?,
        })
    }
}

/// Open a session against the configured contact points without selecting a keyspace.
pub(crate) async fn open_session(config: &StoreConfig) -> Result<Session, StoreError> {
    let policy = DefaultPolicy::builder()
        .prefer_datacenter(config.datacenter.clone())
        .build();

    let profile = ExecutionProfile::builder()
        .load_balancing_policy(policy)
        .build();

    let mut builder = SessionBuilder::new()
        .known_nodes(&config.contact_points)
        .default_execution_profile_handle(profile.into_handle());

    if let Some((user, password)) = config.credentials() {
        builder = builder.user(user, password);
    }

    builder.build().await.map_err(StoreError::connect)
}

/// Store executor backed by a Cassandra (or Scylla) cluster.
pub struct CassandraExecutor {
    session: Session,
    statements: Statements,
}

impl fmt::Debug for CassandraExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CassandraExecutor").finish_non_exhaustive()
    }
}

impl CassandraExecutor {
    /// Connect, select the configured keyspace and prepare every statement.
    ///
    /// # Errors
    ///
    /// Returns an error when the cluster is unreachable, the keyspace is invalid or
    /// missing, or a statement fails to prepare.
    #[tracing::instrument(
        name = "store.cassandra.connect",
        skip(config),
        fields(keyspace = %config.keyspace, datacenter = %config.datacenter),
        err
    )]
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        schema::validate_keyspace_name(&config.keyspace)?;

        let session = open_session(config).await?;

        session
            .use_keyspace(&config.keyspace, false)
            .await
            .map_err(StoreError::connect)?;

        let statements = Statements::prepare(&session).await?;

        info!("connected to store");

        Ok(Self {
            session,
            statements,
        })
    }

    async fn write(
        &self,
        prepared: &Prepared,
        values: impl SerializeRow + Send,
    ) -> Result<(), StoreError> {
        self.session
            .execute_unpaged(&prepared.statement, values)
            .await
            .map_err(|e| StoreError::execute(prepared.name, e))?;

        Ok(())
    }

    async fn read<R>(
        &self,
        prepared: &Prepared,
        values: impl SerializeRow + Send,
    ) -> Result<Vec<R>, StoreError>
    where
        R: for<'frame> DeserializeRow<'frame, 'frame>,
    {
        let result = self
            .session
            .execute_unpaged(&prepared.statement, values)
            .await
            .map_err(|e| StoreError::execute(prepared.name, e))?;

        let rows = result
            .into_rows_result()
            .map_err(|e| StoreError::decode(prepared.name, e))?;

        rows.rows::<R>()
            .map_err(|e| StoreError::decode(prepared.name, e))?
            .map(|row| row.map_err(|e| StoreError::decode(prepared.name, e)))
            .collect()
    }
}

#[async_trait]
impl Executor for CassandraExecutor {
    async fn select_promotion(&self, id: &PromotionId) -> Result<Option<Promotion>, StoreError> {
        let prepared = &self.statements.select_promotion;

        let fetched: Vec<PromotionRow> = self.read(prepared, (id.as_str(),)).await?;

        fetched
            .into_iter()
            .next()
            .map(|row| rows::into_promotion(prepared.name, id, row))
            .transpose()
    }

    async fn insert_promotion(&self, promotion: &Promotion) -> Result<(), StoreError> {
        self.write(
            &self.statements.insert_promotion,
            (
                promotion.id.as_str(),
                promotion.name.as_str(),
                promotion.kind.as_str(),
                try_optional_cql_date(promotion.start_date, "start_date")?,
                try_optional_cql_date(promotion.end_date, "end_date")?,
                promotion.description.as_deref(),
                promotion.stackable,
                to_cql_decimal(promotion.min_order_amount, "min_order_amount")?,
                try_i32_from_u32(promotion.limit_per_customer, "limit_per_customer")?,
                try_optional_i32_from_u32(promotion.global_quota, "global_quota")?,
                &promotion.channels,
            ),
        )
        .await
    }

    async fn delete_promotion(&self, id: &PromotionId) -> Result<(), StoreError> {
        self.write(&self.statements.delete_promotion, (id.as_str(),))
            .await
    }

    async fn select_promotions_by_type(
        &self,
        kind: &str,
    ) -> Result<Vec<PromotionByType>, StoreError> {
        let prepared = &self.statements.select_promotions_by_type;

        let fetched: Vec<PromotionByTypeRow> = self.read(prepared, (kind,)).await?;

        fetched
            .into_iter()
            .map(|row| rows::into_promotion_by_type(prepared.name, kind, row))
            .collect()
    }

    async fn select_products_by_promotion(
        &self,
        id: &PromotionId,
    ) -> Result<Vec<ProductInPromotion>, StoreError> {
        let prepared = &self.statements.select_products_by_promotion;

        let fetched: Vec<ProductInPromotionRow> = self.read(prepared, (id.as_str(),)).await?;

        fetched
            .into_iter()
            .map(|row| rows::into_product_in_promotion(prepared.name, id, row))
            .collect()
    }

    async fn insert_product_by_promotion(
        &self,
        row: &ProductInPromotion,
    ) -> Result<(), StoreError> {
        self.write(
            &self.statements.insert_product_by_promotion,
            (
                row.promotion_id.as_str(),
                row.product_id.as_str(),
                try_i32_from_u32(row.terms.discount_percent, "discount_percent")?,
                try_i32_from_u32(row.terms.discount_amount, "discount_amount")?,
                row.terms.gift_product_id.as_ref().map(|gift| gift.as_str()),
            ),
        )
        .await
    }

    async fn delete_product_by_promotion(
        &self,
        promotion: &PromotionId,
        product: &ProductId,
    ) -> Result<(), StoreError> {
        self.write(
            &self.statements.delete_product_by_promotion,
            (promotion.as_str(), product.as_str()),
        )
        .await
    }

    async fn select_promotions_by_product(
        &self,
        product: &ProductId,
    ) -> Result<Vec<PromotionForProduct>, StoreError> {
        let prepared = &self.statements.select_promotions_by_product;

        let fetched: Vec<PromotionForProductRow> =
            self.read(prepared, (product.as_str(),)).await?;

        fetched
            .into_iter()
            .map(|row| rows::into_promotion_for_product(prepared.name, product, row))
            .collect()
    }

    async fn insert_promotion_by_product(
        &self,
        row: &PromotionForProduct,
    ) -> Result<(), StoreError> {
        self.write(
            &self.statements.insert_promotion_by_product,
            (
                row.product_id.as_str(),
                row.promotion_id.as_str(),
                row.kind.as_str(),
                try_i32_from_u32(row.terms.discount_percent, "discount_percent")?,
                try_i32_from_u32(row.terms.discount_amount, "discount_amount")?,
                row.terms.gift_product_id.as_ref().map(|gift| gift.as_str()),
                try_optional_cql_date(row.start_date, "start_date")?,
                try_optional_cql_date(row.end_date, "end_date")?,
            ),
        )
        .await
    }

    async fn delete_promotion_by_product(
        &self,
        product: &ProductId,
        promotion: &PromotionId,
    ) -> Result<(), StoreError> {
        self.write(
            &self.statements.delete_promotion_by_product,
            (product.as_str(), promotion.as_str()),
        )
        .await
    }

    async fn select_active_by_day(&self, day: Date) -> Result<Vec<ActiveDay>, StoreError> {
        let prepared = &self.statements.select_active_by_day;

        let fetched: Vec<ActiveDayRow> = self
            .read(prepared, (to_cql_date(day, "day")?,))
            .await?;

        fetched
            .into_iter()
            .map(|row| rows::into_active_day(prepared.name, day, row))
            .collect()
    }

    async fn insert_active_day(&self, row: &ActiveDay) -> Result<(), StoreError> {
        self.write(
            &self.statements.insert_active_day,
            (
                to_cql_date(row.day, "day")?,
                row.promotion_id.as_str(),
                row.name.as_str(),
                row.kind.as_str(),
                to_cql_date(row.start_date, "start_date")?,
                to_cql_date(row.end_date, "end_date")?,
            ),
        )
        .await
    }

    async fn delete_active_day(
        &self,
        day: Date,
        promotion: &PromotionId,
    ) -> Result<(), StoreError> {
        self.write(
            &self.statements.delete_active_day,
            (to_cql_date(day, "day")?, promotion.as_str()),
        )
        .await
    }

    async fn release_version(&self) -> Result<String, StoreError> {
        let prepared = &self.statements.release_version;

        let fetched: Vec<(String,)> = self.read(prepared, ()).await?;

        fetched
            .into_iter()
            .next()
            .map(|(version,)| version)
            .ok_or(StoreError::UnexpectedNull {
                statement: prepared.name,
                column: "release_version",
            })
    }
}
