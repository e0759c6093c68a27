//! Typed rows returned by the prepared selects and their conversion into records.

use std::collections::BTreeSet;

use jiff::civil::Date;
use promocat::{
    ids::TypedId,
    memberships::{DiscountTerms, ProductId},
    promotions::{DEFAULT_CHANNEL, Promotion, PromotionId},
};
use rust_decimal::Decimal;
use scylla::value::{CqlDate, CqlDecimal};

use crate::{
    domain::{
        active_days::records::ActiveDay,
        memberships::records::{ProductInPromotion, PromotionForProduct},
        promotions::records::PromotionByType,
    },
    store::{
        StoreError,
        cassandra::values::{from_cql_date, from_cql_decimal, try_optional_date, try_u32_from_i32},
    },
};

pub(super) type PromotionRow = (
    Option<String>,
    Option<String>,
    Option<CqlDate>,
    Option<CqlDate>,
    Option<String>,
    Option<bool>,
    Option<CqlDecimal>,
    Option<i32>,
    Option<i32>,
    Option<BTreeSet<String>>,
);

pub(super) type PromotionByTypeRow = (String, Option<String>, Option<CqlDate>, Option<CqlDate>);

pub(super) type ProductInPromotionRow = (String, Option<i32>, Option<i32>, Option<String>);

pub(super) type PromotionForProductRow = (
    String,
    Option<String>,
    Option<i32>,
    Option<i32>,
    Option<String>,
    Option<CqlDate>,
    Option<CqlDate>,
);

pub(super) type ActiveDayRow = (
    String,
    Option<String>,
    Option<String>,
    Option<CqlDate>,
    Option<CqlDate>,
);

pub(super) fn into_promotion(
    statement: &'static str,
    id: &PromotionId,
    row: PromotionRow,
) -> Result<Promotion, StoreError> {
    let (
        name,
        kind,
        start_date,
        end_date,
        description,
        stackable,
        min_order_amount,
        limit_per_customer,
        global_quota,
        channels,
    ) = row;

    Ok(Promotion {
        id: id.clone(),
        name: required(statement, "name", name)?,
        kind: required(statement, "type", kind)?,
        start_date: try_optional_date(start_date, "start_date")?,
        end_date: try_optional_date(end_date, "end_date")?,
        description,
        stackable: stackable.unwrap_or(false),
        min_order_amount: min_order_amount
            .map(|amount| from_cql_decimal(&amount, "min_order_amount"))
            .transpose()?
            .unwrap_or(Decimal::ZERO),
        limit_per_customer: limit_per_customer
            .map(|limit| try_u32_from_i32(limit, "limit_per_customer"))
            .transpose()?
            .unwrap_or(0),
        global_quota: global_quota
            .map(|quota| try_u32_from_i32(quota, "global_quota"))
            .transpose()?,
        channels: channels
            .filter(|channels| !channels.is_empty())
            .unwrap_or_else(|| BTreeSet::from([DEFAULT_CHANNEL.to_string()])),
    })
}

pub(super) fn into_promotion_by_type(
    statement: &'static str,
    kind: &str,
    row: PromotionByTypeRow,
) -> Result<PromotionByType, StoreError> {
    let (promo_id, name, start_date, end_date) = row;

    Ok(PromotionByType {
        kind: kind.to_string(),
        promotion_id: decode_id(statement, promo_id)?,
        name: name.unwrap_or_default(),
        start_date: try_optional_date(start_date, "start_date")?,
        end_date: try_optional_date(end_date, "end_date")?,
    })
}

pub(super) fn into_product_in_promotion(
    statement: &'static str,
    promotion: &PromotionId,
    row: ProductInPromotionRow,
) -> Result<ProductInPromotion, StoreError> {
    let (product_id, discount_percent, discount_amount, gift_product_id) = row;

    Ok(ProductInPromotion {
        promotion_id: promotion.clone(),
        product_id: decode_id(statement, product_id)?,
        terms: decode_terms(statement, discount_percent, discount_amount, gift_product_id)?,
    })
}

pub(super) fn into_promotion_for_product(
    statement: &'static str,
    product: &ProductId,
    row: PromotionForProductRow,
) -> Result<PromotionForProduct, StoreError> {
    let (promo_id, kind, discount_percent, discount_amount, gift_product_id, start_date, end_date) =
        row;

    Ok(PromotionForProduct {
        product_id: product.clone(),
        promotion_id: decode_id(statement, promo_id)?,
        kind: kind.unwrap_or_default(),
        terms: decode_terms(statement, discount_percent, discount_amount, gift_product_id)?,
        start_date: try_optional_date(start_date, "start_date")?,
        end_date: try_optional_date(end_date, "end_date")?,
    })
}

pub(super) fn into_active_day(
    statement: &'static str,
    day: Date,
    row: ActiveDayRow,
) -> Result<ActiveDay, StoreError> {
    let (promo_id, name, kind, start_date, end_date) = row;

    Ok(ActiveDay {
        day,
        promotion_id: decode_id(statement, promo_id)?,
        name: name.unwrap_or_default(),
        kind: kind.unwrap_or_default(),
        start_date: from_cql_date(required(statement, "start_date", start_date)?, "start_date")?,
        end_date: from_cql_date(required(statement, "end_date", end_date)?, "end_date")?,
    })
}

fn decode_terms(
    statement: &'static str,
    discount_percent: Option<i32>,
    discount_amount: Option<i32>,
    gift_product_id: Option<String>,
) -> Result<DiscountTerms, StoreError> {
    Ok(DiscountTerms {
        discount_percent: try_u32_from_i32(discount_percent.unwrap_or(0), "discount_percent")?,
        discount_amount: try_u32_from_i32(discount_amount.unwrap_or(0), "discount_amount")?,
        gift_product_id: gift_product_id
            .filter(|gift| !gift.trim().is_empty())
            .map(|gift| decode_id(statement, gift))
            .transpose()?,
    })
}

fn decode_id<T>(statement: &'static str, value: String) -> Result<TypedId<T>, StoreError> {
    TypedId::new(value).map_err(|e| StoreError::decode(statement, e))
}

fn required<V>(
    statement: &'static str,
    column: &'static str,
    value: Option<V>,
) -> Result<V, StoreError> {
    value.ok_or(StoreError::UnexpectedNull { statement, column })
}
