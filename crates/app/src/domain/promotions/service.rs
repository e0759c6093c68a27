//! Promotions Service
//!
//! Owns the canonical `promotions_by_id` row. Nothing here touches the membership
//! or active-day views; cascades are the coordinator's job.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use promocat::promotions::{NewPromotion, Promotion, PromotionFields, PromotionId, PromotionPatch};
use tracing::info;

use crate::{
    domain::{ServiceError, promotions::records::PromotionByType},
    store::Executor,
};

#[derive(Clone)]
pub struct StorePromotionsService {
    store: Arc<dyn Executor>,
}

impl fmt::Debug for StorePromotionsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorePromotionsService").finish_non_exhaustive()
    }
}

impl StorePromotionsService {
    #[must_use]
    pub fn new(store: Arc<dyn Executor>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PromotionsService for StorePromotionsService {
    #[tracing::instrument(
        name = "promotions.service.get_promotion",
        skip(self, id),
        fields(promotion_id = %id),
        err
    )]
    async fn get_promotion(&self, id: &PromotionId) -> Result<Promotion, ServiceError> {
        self.store
            .select_promotion(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    #[tracing::instrument(
        name = "promotions.service.create_promotion",
        skip(self, promotion),
        fields(promotion_id = %promotion.id),
        err
    )]
    async fn create_promotion(&self, promotion: NewPromotion) -> Result<Promotion, ServiceError> {
        let record = promotion.into_promotion()?;

        self.store.insert_promotion(&record).await?;

        info!(promotion_id = %record.id, "created promotion");

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.update_promotion",
        skip(self, id, fields),
        fields(promotion_id = %id),
        err
    )]
    async fn update_promotion(
        &self,
        id: PromotionId,
        fields: PromotionFields,
    ) -> Result<Promotion, ServiceError> {
        let record = fields.into_promotion(id)?;

        self.store.insert_promotion(&record).await?;

        info!(promotion_id = %record.id, "replaced promotion");

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.patch_promotion",
        skip(self, id, patch),
        fields(promotion_id = %id),
        err
    )]
    async fn patch_promotion(
        &self,
        id: PromotionId,
        patch: PromotionPatch,
    ) -> Result<Promotion, ServiceError> {
        let current = self.get_promotion(&id).await?;

        if patch.is_empty() {
            return Ok(current);
        }

        let record = patch.apply(current)?;

        self.store.insert_promotion(&record).await?;

        info!(promotion_id = %record.id, "patched promotion");

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.delete_promotion",
        skip(self, id),
        fields(promotion_id = %id),
        err
    )]
    async fn delete_promotion(&self, id: &PromotionId) -> Result<(), ServiceError> {
        self.store.delete_promotion(id).await?;

        info!(promotion_id = %id, "deleted promotion");

        Ok(())
    }

    #[tracing::instrument(name = "promotions.service.list_by_type", skip(self), err)]
    async fn list_by_type(&self, kind: &str) -> Result<Vec<PromotionByType>, ServiceError> {
        Ok(self.store.select_promotions_by_type(kind).await?)
    }
}

#[automock]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    /// Retrieve a single promotion.
    async fn get_promotion(&self, id: &PromotionId) -> Result<Promotion, ServiceError>;

    /// Validate, apply defaults and write a new promotion.
    ///
    /// The store has no uniqueness check; creating an existing id overwrites it.
    async fn create_promotion(&self, promotion: NewPromotion) -> Result<Promotion, ServiceError>;

    /// Overwrite every column of the promotion; absent optionals reset to defaults.
    async fn update_promotion(
        &self,
        id: PromotionId,
        fields: PromotionFields,
    ) -> Result<Promotion, ServiceError>;

    /// Merge the supplied fields into the stored promotion.
    async fn patch_promotion(
        &self,
        id: PromotionId,
        patch: PromotionPatch,
    ) -> Result<Promotion, ServiceError>;

    /// Delete the canonical row only.
    async fn delete_promotion(&self, id: &PromotionId) -> Result<(), ServiceError>;

    /// Promotions of the given type, from the `promotions_by_type` projection.
    async fn list_by_type(&self, kind: &str) -> Result<Vec<PromotionByType>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use promocat::{errors::ValidationError, memberships::ProductId};
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::memberships::MembershipsService, store::MockExecutor, test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn create_promotion_applies_defaults() -> TestResult {
        let ctx = TestContext::new();

        let created = ctx
            .promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;

        let stored = ctx.promotions.get_promotion(&created.id).await?;

        assert_eq!(stored, created);
        assert!(!stored.stackable);
        assert_eq!(stored.min_order_amount, Decimal::ZERO);
        assert_eq!(stored.limit_per_customer, 0);
        assert_eq!(stored.global_quota, None);
        assert!(stored.channels.contains("online"));

        Ok(())
    }

    #[tokio::test]
    async fn create_promotion_twice_overwrites() -> TestResult {
        let ctx = TestContext::new();

        let mut second = ctx.new_promotion("KM03")?;
        second.fields.name = "Renamed".to_string();

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.promotions.create_promotion(second).await?;

        let stored = ctx.promotions.get_promotion(&PromotionId::new("KM03")?).await?;

        assert_eq!(stored.name, "Renamed");

        Ok(())
    }

    #[tokio::test]
    async fn create_promotion_with_inverted_range_writes_nothing() -> TestResult {
        let mut store = MockExecutor::new();

        store.expect_insert_promotion().never();

        let service = StorePromotionsService::new(Arc::new(store));

        let result = service
            .create_promotion(NewPromotion {
                id: PromotionId::new("KM03")?,
                fields: PromotionFields {
                    name: "Year end sale".to_string(),
                    kind: "percentage discount".to_string(),
                    start_date: Some(date(2025, 12, 22)),
                    end_date: Some(date(2025, 12, 20)),
                    ..PromotionFields::default()
                },
            })
            .await;

        assert!(
            matches!(
                result,
                Err(ServiceError::Validation(ValidationError::InvertedRange { .. }))
            ),
            "expected InvertedRange, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_unknown_promotion_returns_not_found() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx.promotions.get_promotion(&PromotionId::new("KM99")?).await;

        assert!(
            matches!(result, Err(ServiceError::NotFound(ref id)) if id.as_str() == "KM99"),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_promotion_resets_unsupplied_optionals() -> TestResult {
        let ctx = TestContext::new();

        let mut promotion = ctx.new_promotion("KM03")?;
        promotion.fields.stackable = Some(true);
        promotion.fields.global_quota = Some(500);

        ctx.promotions.create_promotion(promotion).await?;

        let updated = ctx
            .promotions
            .update_promotion(
                PromotionId::new("KM03")?,
                PromotionFields {
                    name: "Year end sale".to_string(),
                    kind: "percentage discount".to_string(),
                    ..PromotionFields::default()
                },
            )
            .await?;

        assert!(!updated.stackable);
        assert_eq!(updated.global_quota, None);
        assert_eq!(updated.start_date, None);

        Ok(())
    }

    #[tokio::test]
    async fn patch_promotion_keeps_unsupplied_fields() -> TestResult {
        let ctx = TestContext::new();

        let mut promotion = ctx.new_promotion("KM03")?;
        promotion.fields.global_quota = Some(500);

        ctx.promotions.create_promotion(promotion).await?;

        let patched = ctx
            .promotions
            .patch_promotion(
                PromotionId::new("KM03")?,
                PromotionPatch {
                    name: Some("Extended sale".to_string()),
                    end_date: Some(date(2025, 12, 31)),
                    ..PromotionPatch::default()
                },
            )
            .await?;

        assert_eq!(patched.name, "Extended sale");
        assert_eq!(patched.start_date, Some(date(2025, 12, 20)));
        assert_eq!(patched.end_date, Some(date(2025, 12, 31)));
        assert_eq!(patched.global_quota, Some(500));

        let stored = ctx.promotions.get_promotion(&PromotionId::new("KM03")?).await?;

        assert_eq!(stored, patched);

        Ok(())
    }

    #[tokio::test]
    async fn patch_unknown_promotion_returns_not_found() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx
            .promotions
            .patch_promotion(PromotionId::new("KM99")?, PromotionPatch::default())
            .await;

        assert!(
            matches!(result, Err(ServiceError::NotFound(_))),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_promotion_leaves_memberships_in_place() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;

        ctx.promotions.delete_promotion(&km03).await?;

        let result = ctx.promotions.get_promotion(&km03).await;

        assert!(
            matches!(result, Err(ServiceError::NotFound(_))),
            "expected NotFound after deletion, got {result:?}"
        );
        assert_eq!(ctx.memberships.list_by_promotion(&km03).await?.len(), 1);
        assert_eq!(
            ctx.memberships
                .list_by_product(&ProductId::new("SP003")?)
                .await?
                .len(),
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_absent_promotion_succeeds() -> TestResult {
        let ctx = TestContext::new();

        ctx.promotions
            .delete_promotion(&PromotionId::new("KM99")?)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn list_by_type_returns_matching_promotions() -> TestResult {
        let ctx = TestContext::new();

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;

        let mut gift = ctx.new_promotion("KM04")?;
        gift.fields.kind = "gift".to_string();

        ctx.promotions.create_promotion(gift).await?;

        let rows = ctx.promotions.list_by_type("gift").await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().map(|row| row.promotion_id.as_str()), Some("KM04"));

        Ok(())
    }
}
