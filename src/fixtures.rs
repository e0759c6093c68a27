//! Catalog Fixtures
//!
//! YAML seed files describing promotions and their product memberships:
//!
//! ```yaml
//! promotions:
//!   - promo_id: KM03
//!     name: Year end sale
//!     type: percentage discount
//!     start_date: 2025-12-20
//!     end_date: 2025-12-22
//! memberships:
//!   - promo_id: KM03
//!     product_id: SP003
//!     discount_percent: 10
//! ```

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    errors::ValidationError,
    memberships::{MembershipDraft, NewMembership},
    promotions::{NewPromotion, PromotionDraft},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A promotion entry failed validation
    #[error("Invalid promotion `{promo_id}`")]
    InvalidPromotion {
        /// Identifier as written in the fixture
        promo_id: String,

        /// Validation failure
        #[source]
        source: ValidationError,
    },

    /// A membership entry failed validation
    #[error("Invalid membership `{promo_id}` / `{product_id}`")]
    InvalidMembership {
        /// Promotion identifier as written in the fixture
        promo_id: String,

        /// Product identifier as written in the fixture
        product_id: String,

        /// Validation failure
        #[source]
        source: ValidationError,
    },

    /// A membership references a promotion the fixture does not define
    #[error("Membership references unknown promotion `{0}`")]
    UnknownPromotion(String),
}

/// Validated contents of a catalog fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFixture {
    /// Promotions to create, in file order.
    pub promotions: Vec<NewPromotion>,

    /// Memberships to add, in file order.
    pub memberships: Vec<NewMembership>,
}

#[derive(Debug, Deserialize)]
struct RawCatalogFixture {
    #[serde(default)]
    promotions: Vec<PromotionDraft>,

    #[serde(default)]
    memberships: Vec<MembershipDraft>,
}

impl CatalogFixture {
    /// Load and validate a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse and validate fixture YAML.
    ///
    /// Every membership must reference a promotion defined in the same fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or an entry fails validation.
    pub fn from_yaml(contents: &str) -> Result<Self, FixtureError> {
        let raw: RawCatalogFixture = serde_norway::from_str(contents)?;

        let promotions = raw
            .promotions
            .into_iter()
            .map(|draft| {
                let promo_id = draft.promo_id.clone();

                NewPromotion::try_from(draft)
                    .map_err(|source| FixtureError::InvalidPromotion { promo_id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let memberships = raw
            .memberships
            .into_iter()
            .map(|draft| {
                let promo_id = draft.promo_id.clone();
                let product_id = draft.product_id.clone();

                NewMembership::try_from(draft).map_err(|source| FixtureError::InvalidMembership {
                    promo_id,
                    product_id,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(orphan) = memberships.iter().find(|membership| {
            !promotions
                .iter()
                .any(|promotion| promotion.id == membership.promotion_id)
        }) {
            return Err(FixtureError::UnknownPromotion(
                orphan.promotion_id.to_string(),
            ));
        }

        Ok(Self {
            promotions,
            memberships,
        })
    }
}
