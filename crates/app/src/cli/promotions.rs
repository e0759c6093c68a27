use clap::{Args, Subcommand};
use jiff::civil::Date;
use promocat::promotions::{NewPromotion, PromotionFields, PromotionId, PromotionPatch};
use promocat_app::{
    context::AppContext,
    domain::{
        coordinator::{CascadePolicy, PromotionChange},
        promotions::PromotionsService,
    },
};
use rust_decimal::Decimal;

use super::{describe, output};

#[derive(Debug, Args)]
pub(crate) struct PromoCommand {
    #[command(subcommand)]
    command: PromoSubcommand,
}

#[derive(Debug, Subcommand)]
enum PromoSubcommand {
    /// Show one promotion
    Get {
        /// Promotion identifier
        promo_id: String,
    },

    /// Create a promotion; an existing identifier is overwritten
    Create(PromotionArgs),

    /// Replace every field of a promotion and refresh its derived rows
    Update(PromotionArgs),

    /// Change selected fields of a promotion and refresh its derived rows
    Patch(PatchArgs),

    /// Delete a promotion and its memberships
    Delete {
        /// Promotion identifier
        promo_id: String,

        /// Also delete the active-day rows of the promotion's date range
        #[arg(long)]
        purge_active_days: bool,
    },

    /// List promotions of one type
    ByType {
        /// Promotion type, e.g. "percentage discount"
        #[arg(value_name = "TYPE")]
        kind: String,
    },
}

#[derive(Debug, Args)]
pub(crate) struct PromotionArgs {
    /// Promotion identifier
    promo_id: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Promotion type
    #[arg(long = "type", value_name = "TYPE")]
    kind: String,

    /// First active day (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<Date>,

    /// Last active day (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<Date>,

    /// Free-form description
    #[arg(long)]
    description: Option<String>,

    /// Whether the promotion combines with others [default: false]
    #[arg(long)]
    stackable: Option<bool>,

    /// Minimum order amount [default: 0]
    #[arg(long)]
    min_order_amount: Option<Decimal>,

    /// Redemptions per customer, 0 for unlimited [default: 0]
    #[arg(long)]
    limit_per_customer: Option<u32>,

    /// Total redemptions [default: unlimited]
    #[arg(long)]
    global_quota: Option<u32>,

    /// Sales channels, comma separated [default: online]
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<String>>,
}

impl PromotionArgs {
    fn into_parts(self) -> (String, PromotionFields) {
        (
            self.promo_id,
            PromotionFields {
                name: self.name,
                kind: self.kind,
                start_date: self.start_date,
                end_date: self.end_date,
                description: self.description,
                stackable: self.stackable,
                min_order_amount: self.min_order_amount,
                limit_per_customer: self.limit_per_customer,
                global_quota: self.global_quota,
                channels: self.channels,
            },
        )
    }
}

#[derive(Debug, Args)]
pub(crate) struct PatchArgs {
    /// Promotion identifier
    promo_id: String,

    /// New display name
    #[arg(long)]
    name: Option<String>,

    /// New promotion type
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<String>,

    /// New first active day (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<Date>,

    /// New last active day (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<Date>,

    /// New description
    #[arg(long)]
    description: Option<String>,

    /// New stackable flag
    #[arg(long)]
    stackable: Option<bool>,

    /// New minimum order amount
    #[arg(long)]
    min_order_amount: Option<Decimal>,

    /// New per-customer limit
    #[arg(long)]
    limit_per_customer: Option<u32>,

    /// New global quota
    #[arg(long)]
    global_quota: Option<u32>,

    /// New sales channels, comma separated
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<String>>,
}

impl PatchArgs {
    fn into_parts(self) -> (String, PromotionPatch) {
        (
            self.promo_id,
            PromotionPatch {
                name: self.name,
                kind: self.kind,
                start_date: self.start_date,
                end_date: self.end_date,
                description: self.description,
                stackable: self.stackable,
                min_order_amount: self.min_order_amount,
                limit_per_customer: self.limit_per_customer,
                global_quota: self.global_quota,
                channels: self.channels,
            },
        )
    }
}

fn promotion_id(raw: String) -> Result<PromotionId, String> {
    PromotionId::new(raw).map_err(|error| describe("invalid promotion id", &error))
}

pub(crate) async fn run(command: PromoCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        PromoSubcommand::Get { promo_id } => {
            let promotion = ctx
                .promotions
                .get_promotion(&promotion_id(promo_id)?)
                .await
                .map_err(|error| describe("failed to get promotion", &error))?;

            output::print_promotion(&promotion);
        }
        PromoSubcommand::Create(args) => {
            let (promo_id, fields) = args.into_parts();

            let promotion = ctx
                .promotions
                .create_promotion(NewPromotion {
                    id: promotion_id(promo_id)?,
                    fields,
                })
                .await
                .map_err(|error| describe("failed to create promotion", &error))?;

            output::print_promotion(&promotion);
        }
        PromoSubcommand::Update(args) => {
            let (promo_id, fields) = args.into_parts();

            let report = ctx
                .coordinator
                .update_promotion(promotion_id(promo_id)?, PromotionChange::Replace(fields))
                .await
                .map_err(|error| describe("failed to update promotion", &error))?;

            output::print_promotion(&report.promotion);
            println!("snapshots_resynced: {}", report.snapshots_resynced);
            println!("stale_days_removed: {}", report.stale_days_removed);
            println!("active_days_refreshed: {}", report.active_days_refreshed);
        }
        PromoSubcommand::Patch(args) => {
            let (promo_id, patch) = args.into_parts();

            let report = ctx
                .coordinator
                .update_promotion(promotion_id(promo_id)?, PromotionChange::Patch(patch))
                .await
                .map_err(|error| describe("failed to patch promotion", &error))?;

            output::print_promotion(&report.promotion);
            println!("snapshots_resynced: {}", report.snapshots_resynced);
            println!("stale_days_removed: {}", report.stale_days_removed);
            println!("active_days_refreshed: {}", report.active_days_refreshed);
        }
        PromoSubcommand::Delete {
            promo_id,
            purge_active_days,
        } => {
            let report = ctx
                .clone()
                .with_cascade_policy(CascadePolicy { purge_active_days })
                .coordinator
                .delete_promotion_cascade(&promotion_id(promo_id)?)
                .await
                .map_err(|error| describe("failed to delete promotion", &error))?;

            println!("memberships_removed: {}", report.memberships_removed);
            println!("active_days_removed: {}", report.active_days_removed);
        }
        PromoSubcommand::ByType { kind } => {
            let rows = ctx
                .promotions
                .list_by_type(&kind)
                .await
                .map_err(|error| describe("failed to list promotions", &error))?;

            output::print_promotions_by_type(&rows);
        }
    }

    Ok(())
}
