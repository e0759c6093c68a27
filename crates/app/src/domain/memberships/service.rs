//! Memberships Service
//!
//! Keeps `products_by_promo` and `promos_by_product` in step. The two writes of an
//! add are separate statements: a failure between them leaves only the
//! promotion-keyed row, and re-running the add (or a resync) repairs it.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use promocat::{
    memberships::{NewMembership, ProductId},
    promotions::{Promotion, PromotionId},
};
use tracing::{Span, info};

use crate::{
    domain::{
        ServiceError,
        memberships::records::{ProductInPromotion, PromotionForProduct},
    },
    store::Executor,
};

#[derive(Clone)]
pub struct StoreMembershipsService {
    store: Arc<dyn Executor>,
}

impl fmt::Debug for StoreMembershipsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreMembershipsService").finish_non_exhaustive()
    }
}

impl StoreMembershipsService {
    #[must_use]
    pub fn new(store: Arc<dyn Executor>) -> Self {
        Self { store }
    }

    async fn canonical(&self, id: &PromotionId) -> Result<Promotion, ServiceError> {
        self.store
            .select_promotion(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }
}

#[async_trait]
impl MembershipsService for StoreMembershipsService {
    #[tracing::instrument(
        name = "memberships.service.list_by_promotion",
        skip(self, promotion),
        fields(promotion_id = %promotion),
        err
    )]
    async fn list_by_promotion(
        &self,
        promotion: &PromotionId,
    ) -> Result<Vec<ProductInPromotion>, ServiceError> {
        Ok(self.store.select_products_by_promotion(promotion).await?)
    }

    #[tracing::instrument(
        name = "memberships.service.list_by_product",
        skip(self, product),
        fields(product_id = %product),
        err
    )]
    async fn list_by_product(
        &self,
        product: &ProductId,
    ) -> Result<Vec<PromotionForProduct>, ServiceError> {
        Ok(self.store.select_promotions_by_product(product).await?)
    }

    #[tracing::instrument(
        name = "memberships.service.add_membership",
        skip(self, membership),
        fields(
            promotion_id = %membership.promotion_id,
            product_id = %membership.product_id
        ),
        err
    )]
    async fn add_membership(
        &self,
        membership: NewMembership,
    ) -> Result<ProductInPromotion, ServiceError> {
        membership.terms.validate()?;

        let promotion = self.canonical(&membership.promotion_id).await?;

        let row = ProductInPromotion {
            promotion_id: membership.promotion_id,
            product_id: membership.product_id,
            terms: membership.terms,
        };

        self.store.insert_product_by_promotion(&row).await?;

        self.store
            .insert_promotion_by_product(&PromotionForProduct::snapshot(&row, &promotion))
            .await?;

        info!("added product to promotion");

        Ok(row)
    }

    #[tracing::instrument(
        name = "memberships.service.remove_membership",
        skip(self, promotion, product),
        fields(promotion_id = %promotion, product_id = %product),
        err
    )]
    async fn remove_membership(
        &self,
        promotion: &PromotionId,
        product: &ProductId,
    ) -> Result<(), ServiceError> {
        self.store
            .delete_product_by_promotion(promotion, product)
            .await?;

        self.store
            .delete_promotion_by_product(product, promotion)
            .await?;

        info!("removed product from promotion");

        Ok(())
    }

    #[tracing::instrument(
        name = "memberships.service.resync",
        skip(self, promotion),
        fields(promotion_id = %promotion, rows = tracing::field::Empty),
        err
    )]
    async fn resync(&self, promotion: &PromotionId) -> Result<usize, ServiceError> {
        let canonical = self.canonical(promotion).await?;

        let rows = self.store.select_products_by_promotion(promotion).await?;

        for row in &rows {
            self.store
                .insert_promotion_by_product(&PromotionForProduct::snapshot(row, &canonical))
                .await?;
        }

        Span::current().record("rows", rows.len());

        info!("resynced product snapshots");

        Ok(rows.len())
    }
}

#[automock]
#[async_trait]
pub trait MembershipsService: Send + Sync {
    /// Every product in a promotion, from the promotion-keyed view.
    async fn list_by_promotion(
        &self,
        promotion: &PromotionId,
    ) -> Result<Vec<ProductInPromotion>, ServiceError>;

    /// Every promotion applying to a product, with its snapshot of type and dates.
    async fn list_by_product(
        &self,
        product: &ProductId,
    ) -> Result<Vec<PromotionForProduct>, ServiceError>;

    /// Write the membership to both views, promotion-keyed first.
    ///
    /// The promotion is read before either write, so an unknown promotion fails
    /// with `NotFound` and leaves both views untouched.
    async fn add_membership(
        &self,
        membership: NewMembership,
    ) -> Result<ProductInPromotion, ServiceError>;

    /// Delete the membership from both views. Removing an absent pair succeeds.
    async fn remove_membership(
        &self,
        promotion: &PromotionId,
        product: &ProductId,
    ) -> Result<(), ServiceError>;

    /// Rewrite every product-keyed row of the promotion from the promotion-keyed
    /// rows and the promotion's current type and dates. Returns the rows written.
    async fn resync(&self, promotion: &PromotionId) -> Result<usize, ServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use mockall::Sequence;
    use promocat::{errors::ValidationError, memberships::DiscountTerms, promotions::PromotionPatch};
    use testresult::TestResult;

    use crate::{
        domain::promotions::PromotionsService,
        store::{MockExecutor, StoreError},
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn add_membership_is_visible_in_both_views() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;
        let sp003 = ProductId::new("SP003")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;

        let by_promotion = ctx.memberships.list_by_promotion(&km03).await?;
        let by_product = ctx.memberships.list_by_product(&sp003).await?;

        let product_row = by_promotion.first().ok_or("missing promotion-keyed row")?;
        let promotion_row = by_product.first().ok_or("missing product-keyed row")?;

        assert_eq!(product_row.product_id, sp003);
        assert_eq!(promotion_row.promotion_id, km03);
        assert_eq!(product_row.terms, promotion_row.terms);
        assert_eq!(promotion_row.terms.discount_percent, 10);
        assert_eq!(promotion_row.kind, "percentage discount");
        assert_eq!(promotion_row.start_date, Some(date(2025, 12, 20)));
        assert_eq!(promotion_row.end_date, Some(date(2025, 12, 22)));

        Ok(())
    }

    #[tokio::test]
    async fn add_membership_for_unknown_promotion_writes_nothing() -> TestResult {
        let mut store = MockExecutor::new();

        store.expect_select_promotion().returning(|_| Ok(None));
        store.expect_insert_product_by_promotion().never();
        store.expect_insert_promotion_by_product().never();

        let service = StoreMembershipsService::new(Arc::new(store));

        let result = service
            .add_membership(NewMembership {
                promotion_id: PromotionId::new("KM99")?,
                product_id: ProductId::new("SP003")?,
                terms: DiscountTerms::default(),
            })
            .await;

        assert!(
            matches!(result, Err(ServiceError::NotFound(ref id)) if id.as_str() == "KM99"),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_membership_rejects_percent_above_one_hundred() -> TestResult {
        let mut store = MockExecutor::new();

        store.expect_select_promotion().never();

        let service = StoreMembershipsService::new(Arc::new(store));

        let result = service
            .add_membership(NewMembership {
                promotion_id: PromotionId::new("KM03")?,
                product_id: ProductId::new("SP003")?,
                terms: DiscountTerms {
                    discount_percent: 150,
                    ..DiscountTerms::default()
                },
            })
            .await;

        assert!(
            matches!(
                result,
                Err(ServiceError::Validation(ValidationError::PercentOutOfRange(150)))
            ),
            "expected PercentOutOfRange, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_membership_reads_then_writes_promotion_view_first() -> TestResult {
        let ctx = TestContext::new();
        let promotion = ctx.new_promotion("KM03")?.into_promotion()?;

        let mut store = MockExecutor::new();
        let mut seq = Sequence::new();

        store
            .expect_select_promotion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(promotion.clone())));
        store
            .expect_insert_product_by_promotion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        store
            .expect_insert_promotion_by_product()
            .withf(|row| row.kind == "percentage discount")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        StoreMembershipsService::new(Arc::new(store))
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn failed_mirror_write_surfaces_store_error() -> TestResult {
        let ctx = TestContext::new();
        let promotion = ctx.new_promotion("KM03")?.into_promotion()?;

        let mut store = MockExecutor::new();

        store
            .expect_select_promotion()
            .returning(move |_| Ok(Some(promotion.clone())));
        store
            .expect_insert_product_by_promotion()
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_insert_promotion_by_product()
            .times(1)
            .returning(|_| {
                Err(StoreError::Execute {
                    statement: "insert_promotion_by_product",
                    source: "write timeout".into(),
                })
            });

        let result = StoreMembershipsService::new(Arc::new(store))
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await;

        assert!(
            matches!(result, Err(ServiceError::Store(StoreError::Execute { .. }))),
            "expected a store error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn re_adding_repairs_a_half_written_membership() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;
        let sp003 = ProductId::new("SP003")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;

        // Only the first write of an add landed.
        ctx.store
            .insert_product_by_promotion(&ProductInPromotion {
                promotion_id: km03.clone(),
                product_id: sp003.clone(),
                terms: DiscountTerms {
                    discount_percent: 10,
                    ..DiscountTerms::default()
                },
            })
            .await?;

        assert_eq!(ctx.memberships.list_by_promotion(&km03).await?.len(), 1);
        assert!(ctx.memberships.list_by_product(&sp003).await?.is_empty());

        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;

        assert_eq!(ctx.memberships.list_by_promotion(&km03).await?.len(), 1);
        assert_eq!(ctx.memberships.list_by_product(&sp003).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn remove_membership_clears_both_views_and_is_idempotent() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;
        let sp003 = ProductId::new("SP003")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;

        ctx.memberships.remove_membership(&km03, &sp003).await?;
        ctx.memberships.remove_membership(&km03, &sp003).await?;

        assert!(ctx.memberships.list_by_promotion(&km03).await?.is_empty());
        assert!(ctx.memberships.list_by_product(&sp003).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn remove_membership_deletes_promotion_view_first() -> TestResult {
        let mut store = MockExecutor::new();
        let mut seq = Sequence::new();

        store
            .expect_delete_product_by_promotion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_delete_promotion_by_product()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        StoreMembershipsService::new(Arc::new(store))
            .remove_membership(&PromotionId::new("KM03")?, &ProductId::new("SP003")?)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn resync_refreshes_stale_snapshots() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;
        let sp003 = ProductId::new("SP003")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;
        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP004", 5)?)
            .await?;

        ctx.promotions
            .patch_promotion(
                km03.clone(),
                PromotionPatch {
                    end_date: Some(date(2025, 12, 31)),
                    ..PromotionPatch::default()
                },
            )
            .await?;

        let stale = ctx.memberships.list_by_product(&sp003).await?;

        assert_eq!(
            stale.first().and_then(|row| row.end_date),
            Some(date(2025, 12, 22))
        );

        let rewritten = ctx.memberships.resync(&km03).await?;

        assert_eq!(rewritten, 2);

        let fresh = ctx.memberships.list_by_product(&sp003).await?;

        assert_eq!(
            fresh.first().and_then(|row| row.end_date),
            Some(date(2025, 12, 31))
        );
        assert_eq!(fresh.first().map(|row| row.terms.discount_percent), Some(10));

        Ok(())
    }

    #[tokio::test]
    async fn resync_restores_a_missing_product_row() -> TestResult {
        let ctx = TestContext::new();
        let km03 = PromotionId::new("KM03")?;
        let sp003 = ProductId::new("SP003")?;

        ctx.promotions
            .create_promotion(ctx.new_promotion("KM03")?)
            .await?;
        ctx.memberships
            .add_membership(ctx.new_membership("KM03", "SP003", 10)?)
            .await?;

        ctx.store.delete_promotion_by_product(&sp003, &km03).await?;

        ctx.memberships.resync(&km03).await?;

        assert_eq!(ctx.memberships.list_by_product(&sp003).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn resync_unknown_promotion_returns_not_found() -> TestResult {
        let ctx = TestContext::new();

        let result = ctx.memberships.resync(&PromotionId::new("KM99")?).await;

        assert!(
            matches!(result, Err(ServiceError::NotFound(_))),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
