//! Calendar Dates
//!
//! Promotions run over inclusive calendar-date ranges. Active-day expansion walks
//! every day of a range, so the range type guarantees `start <= end` on
//! construction and never has to re-check it.

use jiff::{ToSpan, civil::Date};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Parse an ISO `YYYY-MM-DD` calendar date supplied for `field`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] when `raw` is not a valid calendar date.
pub fn parse_date(field: &'static str, raw: &str) -> Result<Date, ValidationError> {
    raw.trim()
        .parse::<Date>()
        .map_err(|source| ValidationError::InvalidDate {
            field,
            value: raw.to_string(),
            source,
        })
}

/// Parse an optional date, treating blank strings as absent.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] when a non-blank value does not parse.
pub fn parse_optional_date(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<Date>, ValidationError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(field, value))
        .transpose()
}

/// Inclusive calendar-date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange", into = "RawDateRange")]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Create a range from its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] when `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// Create a range from bounds that may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingDateRange`] when either bound is absent, or
    /// [`ValidationError::InvertedRange`] when `start` is after `end`.
    pub fn from_bounds(start: Option<Date>, end: Option<Date>) -> Result<Self, ValidationError> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Err(ValidationError::MissingDateRange),
        }
    }

    /// A range covering exactly one day.
    #[must_use]
    pub const fn single(day: Date) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Last day of the range (inclusive).
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Whether `day` falls within the range.
    #[must_use]
    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }

    /// Every day of the range in ascending order, both ends included.
    pub fn days(&self) -> impl Iterator<Item = Date> + use<> {
        let end = self.end;

        self.start.series(1.day()).take_while(move |day| *day <= end)
    }

    /// Number of days in the range: `(end - start).days + 1`.
    #[must_use]
    pub fn day_count(&self) -> usize {
        self.days().count()
    }

    /// Days of this range that fall outside `other`, in ascending order.
    pub fn days_outside(&self, other: &Self) -> impl Iterator<Item = Date> + use<> {
        let other = *other;

        self.days().filter(move |day| !other.contains(*day))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawDateRange {
    start: Date,
    end: Date,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ValidationError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl From<DateRange> for RawDateRange {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() -> TestResult {
        assert_eq!(parse_date("start_date", "2025-12-20")?, date(2025, 12, 20));
        assert_eq!(parse_date("start_date", " 2025-12-20 ")?, date(2025, 12, 20));

        Ok(())
    }

    #[test]
    fn parse_date_rejects_malformed_dates() {
        for raw in ["2025-13-01", "20/12/2025", "", "2025-02-30"] {
            let result = parse_date("start_date", raw);

            assert!(
                matches!(
                    result,
                    Err(ValidationError::InvalidDate {
                        field: "start_date",
                        ..
                    })
                ),
                "expected InvalidDate for {raw:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn parse_optional_date_treats_blank_as_absent() -> TestResult {
        assert_eq!(parse_optional_date("end_date", None)?, None);
        assert_eq!(parse_optional_date("end_date", Some("  "))?, None);
        assert_eq!(
            parse_optional_date("end_date", Some("2025-12-22"))?,
            Some(date(2025, 12, 22))
        );

        Ok(())
    }

    #[test]
    fn new_rejects_inverted_ranges() {
        let result = DateRange::new(date(2025, 12, 22), date(2025, 12, 20));

        assert!(
            matches!(result, Err(ValidationError::InvertedRange { .. })),
            "expected InvertedRange, got {result:?}"
        );
    }

    #[test]
    fn from_bounds_requires_both_dates() {
        for (start, end) in [
            (None, Some(date(2025, 12, 22))),
            (Some(date(2025, 12, 20)), None),
            (None, None),
        ] {
            let result = DateRange::from_bounds(start, end);

            assert!(
                matches!(result, Err(ValidationError::MissingDateRange)),
                "expected MissingDateRange, got {result:?}"
            );
        }
    }

    #[test]
    fn days_are_inclusive_on_both_ends() -> TestResult {
        let range = DateRange::new(date(2025, 12, 20), date(2025, 12, 22))?;

        let days: Vec<Date> = range.days().collect();

        assert_eq!(
            days,
            vec![date(2025, 12, 20), date(2025, 12, 21), date(2025, 12, 22)]
        );
        assert_eq!(range.day_count(), 3);

        Ok(())
    }

    #[test]
    fn single_day_range_has_one_day() {
        let range = DateRange::single(date(2025, 12, 20));

        assert_eq!(range.days().collect::<Vec<_>>(), vec![date(2025, 12, 20)]);
        assert_eq!(range.day_count(), 1);
    }

    #[test]
    fn day_count_matches_calendar_difference_across_month_and_leap_boundaries() -> TestResult {
        let start = date(2024, 2, 27);
        let end = date(2024, 3, 2);
        let range = DateRange::new(start, end)?;

        let span = start.until(end)?;
        let expected = usize::try_from(span.get_days())? + 1;

        assert_eq!(range.day_count(), expected);
        assert_eq!(range.day_count(), 5);

        Ok(())
    }

    #[test]
    fn days_outside_returns_only_dropped_days() -> TestResult {
        let old = DateRange::new(date(2025, 12, 18), date(2025, 12, 22))?;
        let new = DateRange::new(date(2025, 12, 20), date(2025, 12, 24))?;

        let dropped: Vec<Date> = old.days_outside(&new).collect();

        assert_eq!(dropped, vec![date(2025, 12, 18), date(2025, 12, 19)]);

        Ok(())
    }

    #[test]
    fn deserialize_rejects_inverted_ranges() {
        let result: Result<DateRange, _> =
            serde_norway::from_str("start: 2025-12-22\nend: 2025-12-20\n");

        assert!(result.is_err(), "inverted ranges must not deserialize");
    }
}
