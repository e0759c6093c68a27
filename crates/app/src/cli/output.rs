use std::ops::Range;

use jiff::civil::Date;
use promocat::{memberships::DiscountTerms, promotions::Promotion};
use promocat_app::domain::{
    active_days::records::ActiveDay,
    memberships::records::{ProductInPromotion, PromotionForProduct},
    promotions::records::PromotionByType,
};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

pub(crate) fn print_promotion(promotion: &Promotion) {
    let mut builder = Builder::default();

    builder.push_record(["Field", "Value"]);
    builder.push_record(["promo_id", promotion.id.as_str()]);
    builder.push_record(["name", promotion.name.as_str()]);
    builder.push_record(["type", promotion.kind.as_str()]);
    builder.push_record(["start_date".to_string(), optional_date(promotion.start_date)]);
    builder.push_record(["end_date".to_string(), optional_date(promotion.end_date)]);
    builder.push_record([
        "description",
        promotion.description.as_deref().unwrap_or("-"),
    ]);
    builder.push_record(["stackable".to_string(), promotion.stackable.to_string()]);
    builder.push_record([
        "min_order_amount".to_string(),
        promotion.min_order_amount.to_string(),
    ]);
    builder.push_record([
        "limit_per_customer".to_string(),
        match promotion.limit_per_customer {
            0 => "unlimited".to_string(),
            limit => limit.to_string(),
        },
    ]);
    builder.push_record([
        "global_quota".to_string(),
        promotion
            .global_quota
            .map_or_else(|| "unlimited".to_string(), |quota| quota.to_string()),
    ]);
    builder.push_record([
        "channels".to_string(),
        promotion
            .channels
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    ]);

    print_table(builder, None);
}

pub(crate) fn print_promotions_by_type(rows: &[PromotionByType]) {
    if rows.is_empty() {
        println!("no rows");
        return;
    }

    let mut builder = Builder::default();

    builder.push_record(["promo_id", "name", "start_date", "end_date"]);

    for row in rows {
        builder.push_record([
            row.promotion_id.to_string(),
            row.name.clone(),
            optional_date(row.start_date),
            optional_date(row.end_date),
        ]);
    }

    print_table(builder, None);
}

pub(crate) fn print_products(rows: &[ProductInPromotion]) {
    if rows.is_empty() {
        println!("no rows");
        return;
    }

    let mut builder = Builder::default();

    builder.push_record([
        "product_id",
        "discount_percent",
        "discount_amount",
        "gift_product_id",
    ]);

    for row in rows {
        let [percent, amount, gift] = terms_cells(&row.terms);

        builder.push_record([row.product_id.to_string(), percent, amount, gift]);
    }

    print_table(builder, Some(Columns::new(1..3)));
}

pub(crate) fn print_promotions_for_product(rows: &[PromotionForProduct]) {
    if rows.is_empty() {
        println!("no rows");
        return;
    }

    let mut builder = Builder::default();

    builder.push_record([
        "promo_id",
        "type",
        "discount_percent",
        "discount_amount",
        "gift_product_id",
        "start_date",
        "end_date",
    ]);

    for row in rows {
        let [percent, amount, gift] = terms_cells(&row.terms);

        builder.push_record([
            row.promotion_id.to_string(),
            row.kind.clone(),
            percent,
            amount,
            gift,
            optional_date(row.start_date),
            optional_date(row.end_date),
        ]);
    }

    print_table(builder, Some(Columns::new(2..4)));
}

pub(crate) fn print_active_days(rows: &[ActiveDay]) {
    if rows.is_empty() {
        println!("no rows");
        return;
    }

    let mut builder = Builder::default();

    builder.push_record(["day", "promo_id", "name", "type", "start_date", "end_date"]);

    for row in rows {
        builder.push_record([
            row.day.to_string(),
            row.promotion_id.to_string(),
            row.name.clone(),
            row.kind.clone(),
            row.start_date.to_string(),
            row.end_date.to_string(),
        ]);
    }

    print_table(builder, None);
}

fn terms_cells(terms: &DiscountTerms) -> [String; 3] {
    [
        terms.discount_percent.to_string(),
        terms.discount_amount.to_string(),
        terms
            .gift_product_id
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string),
    ]
}

fn optional_date(date: Option<Date>) -> String {
    date.map_or_else(|| "-".to_string(), |date| date.to_string())
}

fn print_table(builder: Builder, numeric: Option<Columns<Range<usize>>>) {
    let mut table = builder.build();

    table.with(Style::modern_rounded());

    if let Some(columns) = numeric {
        table.modify(columns, Alignment::right());
    }

    println!("{table}");
}
