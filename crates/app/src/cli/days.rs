use clap::{Args, Subcommand};
use jiff::civil::Date;
use promocat::promotions::PromotionId;
use promocat_app::{context::AppContext, domain::active_days::ActiveDaysService};

use super::{describe, output};

#[derive(Debug, Args)]
pub(crate) struct DaysCommand {
    #[command(subcommand)]
    command: DaysSubcommand,
}

#[derive(Debug, Subcommand)]
enum DaysSubcommand {
    /// Write one active-day row per day of a promotion's date range
    Generate {
        /// Promotion identifier
        promo_id: String,
    },

    /// Delete one active-day row
    Delete {
        /// Promotion identifier
        promo_id: String,

        /// Day to delete (YYYY-MM-DD)
        day: Date,
    },

    /// List the promotions active on a day
    Active {
        /// Day to look up (YYYY-MM-DD)
        day: Date,
    },
}

pub(crate) async fn run(command: DaysCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        DaysSubcommand::Generate { promo_id } => {
            let id = PromotionId::new(promo_id)
                .map_err(|error| describe("invalid promotion id", &error))?;

            let written = ctx
                .active_days
                .regenerate(&id)
                .await
                .map_err(|error| describe("failed to generate active days", &error))?;

            println!("days_written: {written}");
        }
        DaysSubcommand::Delete { promo_id, day } => {
            let id = PromotionId::new(promo_id)
                .map_err(|error| describe("invalid promotion id", &error))?;

            ctx.active_days
                .delete_day(&id, day)
                .await
                .map_err(|error| describe("failed to delete active day", &error))?;

            println!("removed");
        }
        DaysSubcommand::Active { day } => {
            let rows = ctx
                .active_days
                .list_active_on(day)
                .await
                .map_err(|error| describe("failed to list active promotions", &error))?;

            output::print_active_days(&rows);
        }
    }

    Ok(())
}
