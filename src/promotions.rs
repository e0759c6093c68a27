//! Promotions
//!
//! The canonical promotion record plus the typed inputs used to create, replace and
//! patch it. Every optional input field has a documented default, applied in one
//! place ([`PromotionFields::into_promotion`]) before anything reaches the store.

use std::collections::BTreeSet;

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    dates::{DateRange, parse_optional_date},
    errors::ValidationError,
    ids::TypedId,
};

/// Promotion identifier, assigned by the caller (e.g. `KM03`).
pub type PromotionId = TypedId<Promotion>;

/// Sales channel used when none is supplied.
pub const DEFAULT_CHANNEL: &str = "online";

/// Canonical promotion record, one per promotion id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Unique, caller-assigned identifier.
    pub id: PromotionId,

    /// Display name.
    pub name: String,

    /// Category tag, e.g. "percentage discount" or "gift".
    #[serde(rename = "type")]
    pub kind: String,

    /// First active day, inclusive.
    pub start_date: Option<Date>,

    /// Last active day, inclusive.
    pub end_date: Option<Date>,

    /// Free-form description.
    pub description: Option<String>,

    /// Whether the promotion may be combined with others.
    pub stackable: bool,

    /// Minimum order amount required to qualify.
    pub min_order_amount: Decimal,

    /// Redemptions allowed per customer; `0` means unlimited.
    pub limit_per_customer: u32,

    /// Total redemptions allowed; `None` means unlimited.
    pub global_quota: Option<u32>,

    /// Sales channels the promotion applies to.
    pub channels: BTreeSet<String>,
}

impl Promotion {
    /// The promotion's validated date range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingDateRange`] when either date is absent, or
    /// [`ValidationError::InvertedRange`] when the stored dates are out of order.
    pub fn date_range(&self) -> Result<DateRange, ValidationError> {
        DateRange::from_bounds(self.start_date, self.end_date)
    }

    /// Split the record back into its identifier and a complete field set.
    #[must_use]
    pub fn into_fields(self) -> (PromotionId, PromotionFields) {
        (
            self.id,
            PromotionFields {
                name: self.name,
                kind: self.kind,
                start_date: self.start_date,
                end_date: self.end_date,
                description: self.description,
                stackable: Some(self.stackable),
                min_order_amount: Some(self.min_order_amount),
                limit_per_customer: Some(self.limit_per_customer),
                global_quota: self.global_quota,
                channels: Some(self.channels.into_iter().collect()),
            },
        )
    }
}

/// Every caller-supplied promotion field except the identifier.
///
/// Absent optionals take these defaults: `stackable = false`,
/// `min_order_amount = 0`, `limit_per_customer = 0` (unlimited),
/// `global_quota = None` (unlimited), `channels = {"online"}`.
///
/// Replacing a promotion with a `PromotionFields` overwrites the whole row, so an
/// absent optional resets that column to its default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionFields {
    /// Display name (required).
    pub name: String,

    /// Category tag (required).
    pub kind: String,

    /// First active day.
    pub start_date: Option<Date>,

    /// Last active day.
    pub end_date: Option<Date>,

    /// Free-form description; blank text is stored as absent.
    pub description: Option<String>,

    /// Defaults to `false`.
    pub stackable: Option<bool>,

    /// Defaults to `0`.
    pub min_order_amount: Option<Decimal>,

    /// Defaults to `0` (unlimited).
    pub limit_per_customer: Option<u32>,

    /// Defaults to unlimited.
    pub global_quota: Option<u32>,

    /// Defaults to `["online"]`.
    pub channels: Option<Vec<String>>,
}

impl PromotionFields {
    /// Validate the fields and apply defaults, producing the canonical record.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for blank names or types, inverted date
    /// ranges, or a negative minimum order amount.
    pub fn into_promotion(self, id: PromotionId) -> Result<Promotion, ValidationError> {
        let name = required("name", self.name)?;
        let kind = required("type", self.kind)?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            DateRange::new(start, end)?;
        }

        let min_order_amount = self.min_order_amount.unwrap_or(Decimal::ZERO);

        if min_order_amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                field: "min_order_amount",
                value: min_order_amount,
            });
        }

        Ok(Promotion {
            id,
            name,
            kind,
            start_date: self.start_date,
            end_date: self.end_date,
            description: self
                .description
                .filter(|description| !description.trim().is_empty()),
            stackable: self.stackable.unwrap_or(false),
            min_order_amount,
            limit_per_customer: self.limit_per_customer.unwrap_or(0),
            global_quota: self.global_quota,
            channels: normalize_channels(self.channels),
        })
    }
}

/// Input for creating a promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromotion {
    /// Identifier of the new promotion.
    pub id: PromotionId,

    /// Field values; absent optionals take their defaults.
    pub fields: PromotionFields,
}

impl NewPromotion {
    /// Validate and build the canonical record.
    ///
    /// # Errors
    ///
    /// See [`PromotionFields::into_promotion`].
    pub fn into_promotion(self) -> Result<Promotion, ValidationError> {
        self.fields.into_promotion(self.id)
    }
}

/// Partial promotion change merged into the stored record (read-merge-write).
///
/// `None` keeps the stored value. Patches cannot clear nullable columns; replace
/// the promotion with a full [`PromotionFields`] to do that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPatch {
    /// New display name.
    pub name: Option<String>,

    /// New category tag.
    pub kind: Option<String>,

    /// New first active day.
    pub start_date: Option<Date>,

    /// New last active day.
    pub end_date: Option<Date>,

    /// New description.
    pub description: Option<String>,

    /// New stackable flag.
    pub stackable: Option<bool>,

    /// New minimum order amount.
    pub min_order_amount: Option<Decimal>,

    /// New per-customer limit.
    pub limit_per_customer: Option<u32>,

    /// New global quota.
    pub global_quota: Option<u32>,

    /// New channel set.
    pub channels: Option<Vec<String>>,
}

impl PromotionPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into `current` and re-validate the result.
    ///
    /// # Errors
    ///
    /// See [`PromotionFields::into_promotion`]; a patch that moves one date past
    /// the other fails with [`ValidationError::InvertedRange`].
    pub fn apply(self, current: Promotion) -> Result<Promotion, ValidationError> {
        let (id, mut fields) = current.into_fields();

        if let Some(name) = self.name {
            fields.name = name;
        }

        if let Some(kind) = self.kind {
            fields.kind = kind;
        }

        fields.start_date = self.start_date.or(fields.start_date);
        fields.end_date = self.end_date.or(fields.end_date);
        fields.description = self.description.or(fields.description);
        fields.stackable = self.stackable.or(fields.stackable);
        fields.min_order_amount = self.min_order_amount.or(fields.min_order_amount);
        fields.limit_per_customer = self.limit_per_customer.or(fields.limit_per_customer);
        fields.global_quota = self.global_quota.or(fields.global_quota);
        fields.channels = self.channels.or(fields.channels);

        fields.into_promotion(id)
    }
}

/// Raw promotion input as supplied by external callers and fixture files.
///
/// Dates are ISO `YYYY-MM-DD` strings and are only parsed on conversion into a
/// [`NewPromotion`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionDraft {
    /// Promotion identifier.
    pub promo_id: String,

    /// Display name.
    pub name: String,

    /// Category tag.
    #[serde(rename = "type")]
    pub kind: String,

    /// First active day as `YYYY-MM-DD`.
    pub start_date: Option<String>,

    /// Last active day as `YYYY-MM-DD`.
    pub end_date: Option<String>,

    /// Free-form description.
    pub description: Option<String>,

    /// Stackable flag.
    pub stackable: Option<bool>,

    /// Minimum order amount.
    pub min_order_amount: Option<Decimal>,

    /// Per-customer redemption limit.
    pub limit_per_customer: Option<u32>,

    /// Global redemption quota.
    pub global_quota: Option<u32>,

    /// Sales channels.
    pub channels: Option<Vec<String>>,
}

impl TryFrom<PromotionDraft> for NewPromotion {
    type Error = ValidationError;

    fn try_from(draft: PromotionDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PromotionId::new(draft.promo_id)?,
            fields: PromotionFields {
                start_date: parse_optional_date("start_date", draft.start_date.as_deref())?,
                end_date: parse_optional_date("end_date", draft.end_date.as_deref())?,
                name: draft.name,
                kind: draft.kind,
                description: draft.description,
                stackable: draft.stackable,
                min_order_amount: draft.min_order_amount,
                limit_per_customer: draft.limit_per_customer,
                global_quota: draft.global_quota,
                channels: draft.channels,
            },
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }

    Ok(trimmed.to_string())
}

fn normalize_channels(channels: Option<Vec<String>>) -> BTreeSet<String> {
    let channels: BTreeSet<String> = channels
        .unwrap_or_default()
        .into_iter()
        .map(|channel| channel.trim().to_string())
        .filter(|channel| !channel.is_empty())
        .collect();

    if channels.is_empty() {
        BTreeSet::from([DEFAULT_CHANNEL.to_string()])
    } else {
        channels
    }
}
