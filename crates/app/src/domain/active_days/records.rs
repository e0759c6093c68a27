//! Active Day Records

use jiff::civil::Date;
use promocat::promotions::PromotionId;

/// Row of `promotions_active_by_day`: promotion `promotion_id` runs on `day`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDay {
    pub day: Date,
    pub promotion_id: PromotionId,
    pub name: String,
    pub kind: String,
    pub start_date: Date,
    pub end_date: Date,
}
