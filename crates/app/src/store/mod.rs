//! Query Executor
//!
//! The store seam. Each method issues exactly one parameterized point read, point
//! write or point delete against one table; there are no multi-statement batches and
//! no cross-table transactions. Writes are upserts and deletes of absent rows
//! succeed, so every individual statement is idempotent and safe to retry.
//!
//! | table                      | partition key | clustering key |
//! |----------------------------|---------------|----------------|
//! | `promotions_by_id`         | `promo_id`    |                |
//! | `products_by_promo`        | `promo_id`    | `product_id`   |
//! | `promos_by_product`        | `product_id`  | `promo_id`     |
//! | `promotions_active_by_day` | `day`         | `promo_id`     |
//! | `promotions_by_type`       | `type`        | `promo_id`     |

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use promocat::{
    memberships::ProductId,
    promotions::{Promotion, PromotionId},
};

use crate::domain::{
    active_days::records::ActiveDay,
    memberships::records::{ProductInPromotion, PromotionForProduct},
    promotions::records::PromotionByType,
};

pub mod cassandra;
mod errors;
pub mod memory;

pub use errors::StoreError;

#[automock]
#[async_trait]
pub trait Executor: Send + Sync {
    /// Point read of the canonical promotion row.
    async fn select_promotion(&self, id: &PromotionId) -> Result<Option<Promotion>, StoreError>;

    /// Upsert the full canonical promotion row.
    async fn insert_promotion(&self, promotion: &Promotion) -> Result<(), StoreError>;

    /// Delete the canonical promotion row.
    async fn delete_promotion(&self, id: &PromotionId) -> Result<(), StoreError>;

    /// Read the `promotions_by_type` partition for `kind`.
    async fn select_promotions_by_type(
        &self,
        kind: &str,
    ) -> Result<Vec<PromotionByType>, StoreError>;

    /// Read the promotion-keyed membership partition.
    async fn select_products_by_promotion(
        &self,
        id: &PromotionId,
    ) -> Result<Vec<ProductInPromotion>, StoreError>;

    /// Upsert one promotion-keyed membership row.
    async fn insert_product_by_promotion(&self, row: &ProductInPromotion)
    -> Result<(), StoreError>;

    /// Delete one promotion-keyed membership row.
    async fn delete_product_by_promotion(
        &self,
        promotion: &PromotionId,
        product: &ProductId,
    ) -> Result<(), StoreError>;

    /// Read the product-keyed membership partition.
    async fn select_promotions_by_product(
        &self,
        product: &ProductId,
    ) -> Result<Vec<PromotionForProduct>, StoreError>;

    /// Upsert one product-keyed membership row.
    async fn insert_promotion_by_product(
        &self,
        row: &PromotionForProduct,
    ) -> Result<(), StoreError>;

    /// Delete one product-keyed membership row.
    async fn delete_promotion_by_product(
        &self,
        product: &ProductId,
        promotion: &PromotionId,
    ) -> Result<(), StoreError>;

    /// Read the active-day partition for `day`.
    async fn select_active_by_day(&self, day: Date) -> Result<Vec<ActiveDay>, StoreError>;

    /// Upsert one active-day row.
    async fn insert_active_day(&self, row: &ActiveDay) -> Result<(), StoreError>;

    /// Delete one active-day row.
    async fn delete_active_day(&self, day: Date, promotion: &PromotionId)
    -> Result<(), StoreError>;

    /// Store version string, used as a health check.
    async fn release_version(&self) -> Result<String, StoreError>;
}
