//! Schema bootstrap.

use scylla::client::session::Session;
use tracing::{info, warn};

use crate::{
    config::StoreConfig,
    store::{StoreError, cassandra::open_session},
};

const TABLES: [(&str, &str); 4] = [
    (
        "create_promotions_by_id",
        include_str!("cql/schema/promotions_by_id.cql"),
    ),
    (
        "create_products_by_promo",
        include_str!("cql/schema/products_by_promo.cql"),
    ),
    (
        "create_promos_by_product",
        include_str!("cql/schema/promos_by_product.cql"),
    ),
    (
        "create_promotions_active_by_day",
        include_str!("cql/schema/promotions_active_by_day.cql"),
    ),
];

const CREATE_PROMOTIONS_BY_TYPE_CQL: &str = include_str!("cql/schema/promotions_by_type.cql");

/// Create the keyspace, tables and the `promotions_by_type` view when missing.
///
/// Clusters that disable materialized views only log a warning for the view.
///
/// # Errors
///
/// Returns an error when the keyspace name is invalid or a keyspace or table
/// statement fails.
#[tracing::instrument(
    name = "store.cassandra.apply_schema",
    skip(config),
    fields(keyspace = %config.keyspace),
    err
)]
pub async fn apply_schema(config: &StoreConfig, replication_factor: u32) -> Result<(), StoreError> {
    validate_keyspace_name(&config.keyspace)?;

    let session = open_session(config).await?;

    run(
        &session,
        "create_keyspace",
        create_keyspace_cql(&config.keyspace, replication_factor),
    )
    .await?;

    session
        .use_keyspace(&config.keyspace, false)
        .await
        .map_err(StoreError::connect)?;

    for (name, cql) in TABLES {
        run(&session, name, cql.to_string()).await?;
    }

    if let Err(error) = run(
        &session,
        "create_promotions_by_type",
        CREATE_PROMOTIONS_BY_TYPE_CQL.to_string(),
    )
    .await
    {
        warn!(%error, "materialized view promotions_by_type was not created");
    }

    info!("schema applied");

    Ok(())
}

async fn run(session: &Session, name: &'static str, cql: String) -> Result<(), StoreError> {
    session
        .query_unpaged(cql, ())
        .await
        .map_err(|e| StoreError::execute(name, e))?;

    Ok(())
}

fn create_keyspace_cql(keyspace: &str, replication_factor: u32) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
    )
}

/// Validate a keyspace name before it is interpolated into CQL.
///
/// Keyspace names must:
/// - Be 1-48 characters long
/// - Start with a letter
/// - Contain only letters, digits and underscores
/// - Not be a reserved CQL keyword
pub(crate) fn validate_keyspace_name(name: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidKeyspace(name.to_string());

    if name.is_empty() || name.len() > 48 {
        return Err(invalid());
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid());
    }

    let reserved_words = [
        "keyspace", "table", "select", "insert", "update", "delete", "drop", "create", "alter",
        "index", "system", "schema", "grant", "revoke", "batch",
    ];

    if reserved_words
        .iter()
        .any(|&word| name.eq_ignore_ascii_case(word))
    {
        return Err(invalid());
    }

    Ok(())
}
