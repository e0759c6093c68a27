//! Memberships Records
//!
//! One membership fact is written twice, once per direction. Both rows carry the
//! same [`DiscountTerms`].

use jiff::civil::Date;
use promocat::{
    memberships::{DiscountTerms, ProductId},
    promotions::{Promotion, PromotionId},
};

/// Row of `products_by_promo`, keyed by promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInPromotion {
    pub promotion_id: PromotionId,
    pub product_id: ProductId,
    pub terms: DiscountTerms,
}

/// Row of `promos_by_product`, keyed by product.
///
/// `kind`, `start_date` and `end_date` are a snapshot of the promotion taken when
/// the row was written. They are refreshed by a resync, never read through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionForProduct {
    pub product_id: ProductId,
    pub promotion_id: PromotionId,
    pub kind: String,
    pub terms: DiscountTerms,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl PromotionForProduct {
    /// Mirror of `row` carrying `promotion`'s current snapshot.
    #[must_use]
    pub fn snapshot(row: &ProductInPromotion, promotion: &Promotion) -> Self {
        Self {
            product_id: row.product_id.clone(),
            promotion_id: row.promotion_id.clone(),
            kind: promotion.kind.clone(),
            terms: row.terms.clone(),
            start_date: promotion.start_date,
            end_date: promotion.end_date,
        }
    }
}
