use std::path::PathBuf;

use clap::Args;
use promocat::fixtures::CatalogFixture;
use promocat_app::{
    context::AppContext,
    domain::{
        active_days::ActiveDaysService, memberships::MembershipsService,
        promotions::PromotionsService,
    },
};
use tracing::info;

use super::describe;

#[derive(Debug, Args)]
pub(crate) struct SeedArgs {
    /// YAML fixture file
    path: PathBuf,

    /// Also write active days for every seeded promotion with a date range
    #[arg(long)]
    generate_active_days: bool,
}

pub(crate) async fn run(args: SeedArgs, ctx: &AppContext) -> Result<(), String> {
    let fixture = CatalogFixture::load(&args.path)
        .map_err(|error| describe("failed to load fixture", &error))?;

    let mut promotions_seeded = 0;
    let mut dated = Vec::new();

    for new_promotion in fixture.promotions {
        let promotion = ctx
            .promotions
            .create_promotion(new_promotion)
            .await
            .map_err(|error| describe("failed to seed promotion", &error))?;

        promotions_seeded += 1;

        if promotion.start_date.is_some() && promotion.end_date.is_some() {
            dated.push(promotion.id);
        }
    }

    let mut memberships_seeded = 0;

    for membership in fixture.memberships {
        ctx.memberships
            .add_membership(membership)
            .await
            .map_err(|error| describe("failed to seed membership", &error))?;

        memberships_seeded += 1;
    }

    let mut days_written = 0;

    if args.generate_active_days {
        for id in &dated {
            days_written += ctx
                .active_days
                .regenerate(id)
                .await
                .map_err(|error| describe("failed to generate active days", &error))?;
        }
    }

    info!(
        path = %args.path.display(),
        promotions = promotions_seeded,
        memberships = memberships_seeded,
        days = days_written,
        "seeded catalog fixture"
    );

    println!("promotions_seeded: {promotions_seeded}");
    println!("memberships_seeded: {memberships_seeded}");
    println!("active_days_written: {days_written}");

    Ok(())
}
