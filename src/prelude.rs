//! Promocat prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    dates::{DateRange, parse_date, parse_optional_date},
    errors::ValidationError,
    fixtures::{CatalogFixture, FixtureError},
    ids::TypedId,
    memberships::{DiscountTerms, MembershipDraft, NewMembership, Product, ProductId},
    promotions::{
        DEFAULT_CHANNEL, NewPromotion, Promotion, PromotionDraft, PromotionFields, PromotionId,
        PromotionPatch,
    },
};
