//! Conversions between domain values and CQL column values.

use jiff::{
    Span, Unit,
    civil::{Date, date},
};
use rust_decimal::Decimal;
use scylla::value::{CqlDate, CqlDecimal};

use crate::store::StoreError;

/// CQL `date` counts days with the Unix epoch centred at `2^31`.
const CQL_DATE_EPOCH_OFFSET: i64 = 1 << 31;

const UNIX_EPOCH: Date = date(1970, 1, 1);

pub(super) fn to_cql_date(value: Date, column: &'static str) -> Result<CqlDate, StoreError> {
    let days = UNIX_EPOCH
        .until((Unit::Day, value))
        .map_err(|e| StoreError::out_of_range(column, e))?
        .get_days();

    u32::try_from(i64::from(days) + CQL_DATE_EPOCH_OFFSET)
        .map(CqlDate)
        .map_err(|e| StoreError::out_of_range(column, e))
}

pub(super) fn try_optional_cql_date(
    value: Option<Date>,
    column: &'static str,
) -> Result<Option<CqlDate>, StoreError> {
    value.map(|v| to_cql_date(v, column)).transpose()
}

pub(super) fn from_cql_date(value: CqlDate, column: &'static str) -> Result<Date, StoreError> {
    let days = i64::from(value.0) - CQL_DATE_EPOCH_OFFSET;

    Span::new()
        .try_days(days)
        .and_then(|span| UNIX_EPOCH.checked_add(span))
        .map_err(|e| StoreError::out_of_range(column, e))
}

pub(super) fn try_optional_date(
    value: Option<CqlDate>,
    column: &'static str,
) -> Result<Option<Date>, StoreError> {
    value.map(|v| from_cql_date(v, column)).transpose()
}

pub(super) fn to_cql_decimal(
    value: Decimal,
    column: &'static str,
) -> Result<CqlDecimal, StoreError> {
    let bytes = value.mantissa().to_be_bytes();
    let scale = i32::try_from(value.scale()).map_err(|e| StoreError::out_of_range(column, e))?;

    Ok(CqlDecimal::from_signed_be_bytes_slice_and_exponent(
        minimal_twos_complement(&bytes),
        scale,
    ))
}

pub(super) fn from_cql_decimal(
    value: &CqlDecimal,
    column: &'static str,
) -> Result<Decimal, StoreError> {
    let (bytes, scale) = value.as_signed_be_bytes_slice_and_exponent();

    if bytes.len() > 16 {
        return Err(StoreError::OutOfRange {
            column,
            source: None,
        });
    }

    let fill = match bytes.first() {
        Some(byte) if byte & 0x80 != 0 => 0xFF,
        _ => 0x00,
    };

    let mut buffer = [fill; 16];

    if let Some(tail) = buffer.get_mut(16 - bytes.len()..) {
        tail.copy_from_slice(bytes);
    }

    let mantissa = i128::from_be_bytes(buffer);

    // A negative scale multiplies the unscaled value by a power of ten.
    let (mantissa, scale) = match u32::try_from(scale) {
        Ok(scale) => (mantissa, scale),
        Err(_) => {
            let widened = 10_i128
                .checked_pow(scale.unsigned_abs())
                .and_then(|factor| mantissa.checked_mul(factor))
                .ok_or(StoreError::OutOfRange {
                    column,
                    source: None,
                })?;

            (widened, 0)
        }
    };

    Decimal::try_from_i128_with_scale(mantissa, scale)
        .map_err(|e| StoreError::out_of_range(column, e))
}

pub(super) fn try_i32_from_u32(value: u32, column: &'static str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|e| StoreError::out_of_range(column, e))
}

pub(super) fn try_optional_i32_from_u32(
    value: Option<u32>,
    column: &'static str,
) -> Result<Option<i32>, StoreError> {
    value.map(|v| try_i32_from_u32(v, column)).transpose()
}

pub(super) fn try_u32_from_i32(value: i32, column: &'static str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|e| StoreError::out_of_range(column, e))
}

pub(super) fn try_optional_u32_from_i32(
    value: Option<i32>,
    column: &'static str,
) -> Result<Option<u32>, StoreError> {
    value.map(|v| try_u32_from_i32(v, column)).transpose()
}

/// Strip redundant sign-extension bytes from a big-endian two's-complement integer.
fn minimal_twos_complement(bytes: &[u8]) -> &[u8] {
    let mut start = 0;

    while let (Some(&current), Some(&next)) = (bytes.get(start), bytes.get(start + 1)) {
        let redundant =
            (current == 0x00 && next & 0x80 == 0) || (current == 0xFF && next & 0x80 != 0);

        if !redundant {
            break;
        }

        start += 1;
    }

    bytes.get(start..).unwrap_or(bytes)
}
