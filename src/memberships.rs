//! Memberships
//!
//! A membership links one promotion to one product together with the discount
//! terms that apply to that pairing.

use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, ids::TypedId, promotions::PromotionId};

/// Catalog product. Products live in the catalog; only their identifiers appear here.
#[derive(Debug, Clone, Copy)]
pub struct Product;

/// Product identifier, assigned by the catalog (e.g. `SP003`).
pub type ProductId = TypedId<Product>;

/// Discount terms carried by a membership, identical in both directional views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountTerms {
    /// Percentage off, `0..=100`.
    pub discount_percent: u32,

    /// Fixed amount off.
    pub discount_amount: u32,

    /// Product given away with the purchase, if any.
    pub gift_product_id: Option<ProductId>,
}

impl DiscountTerms {
    /// Check the terms before they are written.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PercentOutOfRange`] when the percentage exceeds 100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.discount_percent > 100 {
            return Err(ValidationError::PercentOutOfRange(self.discount_percent));
        }

        Ok(())
    }
}

/// Input for adding a product to a promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    /// Promotion the product joins.
    pub promotion_id: PromotionId,

    /// Product joining the promotion.
    pub product_id: ProductId,

    /// Terms for the pairing.
    pub terms: DiscountTerms,
}

/// Raw membership input from fixture files; absent discounts default to `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipDraft {
    /// Promotion identifier.
    pub promo_id: String,

    /// Product identifier.
    pub product_id: String,

    /// Percentage off.
    #[serde(default)]
    pub discount_percent: u32,

    /// Fixed amount off.
    #[serde(default)]
    pub discount_amount: u32,

    /// Gift product identifier; blank is treated as absent.
    #[serde(default)]
    pub gift_product_id: Option<String>,
}

impl TryFrom<MembershipDraft> for NewMembership {
    type Error = ValidationError;

    fn try_from(draft: MembershipDraft) -> Result<Self, Self::Error> {
        let terms = DiscountTerms {
            discount_percent: draft.discount_percent,
            discount_amount: draft.discount_amount,
            gift_product_id: draft
                .gift_product_id
                .filter(|gift| !gift.trim().is_empty())
                .map(ProductId::new)
                .transpose()?,
        };

        terms.validate()?;

        Ok(Self {
            promotion_id: PromotionId::new(draft.promo_id)?,
            product_id: ProductId::new(draft.product_id)?,
            terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn draft_defaults_discounts_to_zero() -> TestResult {
        let draft: MembershipDraft = serde_norway::from_str("promo_id: KM03\nproduct_id: SP003\n")?;

        let membership = NewMembership::try_from(draft)?;

        assert_eq!(membership.terms, DiscountTerms::default());

        Ok(())
    }

    #[test]
    fn blank_gift_product_is_absent() -> TestResult {
        let membership = NewMembership::try_from(MembershipDraft {
            promo_id: "KM03".to_string(),
            product_id: "SP003".to_string(),
            discount_percent: 10,
            discount_amount: 0,
            gift_product_id: Some(" ".to_string()),
        })?;

        assert_eq!(membership.terms.gift_product_id, None);

        Ok(())
    }

    #[test]
    fn percent_above_one_hundred_is_rejected() {
        let result = NewMembership::try_from(MembershipDraft {
            promo_id: "KM03".to_string(),
            product_id: "SP003".to_string(),
            discount_percent: 101,
            discount_amount: 0,
            gift_product_id: None,
        });

        assert!(
            matches!(result, Err(ValidationError::PercentOutOfRange(101))),
            "expected PercentOutOfRange, got {result:?}"
        );
    }
}
