//! Promotions Records

use jiff::civil::Date;
use promocat::promotions::PromotionId;

/// Row of the `promotions_by_type` projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionByType {
    pub kind: String,
    pub promotion_id: PromotionId,
    pub name: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}
