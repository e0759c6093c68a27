//! Validation Errors

use jiff::civil::Date;
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed or missing caller input.
///
/// Validation always happens before any write is issued, so a validation failure
/// never leaves partially written state behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required text field was empty.
    #[error("{field} must not be blank")]
    Blank {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A date string could not be parsed as `YYYY-MM-DD`.
    #[error("invalid {field} `{value}`, expected YYYY-MM-DD")]
    InvalidDate {
        /// Name of the offending field.
        field: &'static str,

        /// The raw value supplied.
        value: String,

        /// Parser failure.
        #[source]
        source: jiff::Error,
    },

    /// The start date is after the end date.
    #[error("start date {start} is after end date {end}")]
    InvertedRange {
        /// Supplied start date.
        start: Date,

        /// Supplied end date.
        end: Date,
    },

    /// An operation needs both a start and an end date.
    #[error("promotion is missing a start or end date")]
    MissingDateRange,

    /// A monetary amount was negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount {
        /// Name of the offending field.
        field: &'static str,

        /// The supplied amount.
        value: Decimal,
    },

    /// A discount percentage above 100.
    #[error("discount percentage must be between 0 and 100, got {0}")]
    PercentOutOfRange(u32),
}
