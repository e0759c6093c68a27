use clap::{Args, Subcommand};
use promocat::{
    memberships::{DiscountTerms, NewMembership, ProductId},
    promotions::PromotionId,
};
use promocat_app::{context::AppContext, domain::memberships::MembershipsService};

use super::{describe, output};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List the products in a promotion
    List {
        /// Promotion identifier
        promo_id: String,
    },

    /// Add a product to a promotion
    Add(AddArgs),

    /// Remove a product from a promotion
    Remove {
        /// Promotion identifier
        promo_id: String,

        /// Product identifier
        product_id: String,
    },

    /// List the promotions applying to a product
    Promos {
        /// Product identifier
        product_id: String,
    },

    /// Rewrite a promotion's product-keyed rows from its promotion-keyed rows
    Resync {
        /// Promotion identifier
        promo_id: String,
    },
}

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Promotion identifier
    promo_id: String,

    /// Product identifier
    product_id: String,

    /// Percentage off, 0 to 100
    #[arg(long, default_value_t = 0)]
    discount_percent: u32,

    /// Fixed amount off
    #[arg(long, default_value_t = 0)]
    discount_amount: u32,

    /// Product given away with this one
    #[arg(long)]
    gift_product_id: Option<String>,
}

impl AddArgs {
    fn into_membership(self) -> Result<NewMembership, String> {
        let gift_product_id = self
            .gift_product_id
            .map(product_id)
            .transpose()?;

        Ok(NewMembership {
            promotion_id: promotion_id(self.promo_id)?,
            product_id: product_id(self.product_id)?,
            terms: DiscountTerms {
                discount_percent: self.discount_percent,
                discount_amount: self.discount_amount,
                gift_product_id,
            },
        })
    }
}

fn promotion_id(raw: String) -> Result<PromotionId, String> {
    PromotionId::new(raw).map_err(|error| describe("invalid promotion id", &error))
}

fn product_id(raw: String) -> Result<ProductId, String> {
    ProductId::new(raw).map_err(|error| describe("invalid product id", &error))
}

pub(crate) async fn run(command: ProductsCommand, ctx: &AppContext) -> Result<(), String> {
    match command.command {
        ProductsSubcommand::List { promo_id } => {
            let rows = ctx
                .memberships
                .list_by_promotion(&promotion_id(promo_id)?)
                .await
                .map_err(|error| describe("failed to list products", &error))?;

            output::print_products(&rows);
        }
        ProductsSubcommand::Add(args) => {
            let row = ctx
                .memberships
                .add_membership(args.into_membership()?)
                .await
                .map_err(|error| describe("failed to add product", &error))?;

            output::print_products(std::slice::from_ref(&row));
        }
        ProductsSubcommand::Remove {
            promo_id,
            product_id: product,
        } => {
            ctx.memberships
                .remove_membership(&promotion_id(promo_id)?, &product_id(product)?)
                .await
                .map_err(|error| describe("failed to remove product", &error))?;

            println!("removed");
        }
        ProductsSubcommand::Promos { product_id: product } => {
            let rows = ctx
                .memberships
                .list_by_product(&product_id(product)?)
                .await
                .map_err(|error| describe("failed to list promotions", &error))?;

            output::print_promotions_for_product(&rows);
        }
        ProductsSubcommand::Resync { promo_id } => {
            let written = ctx
                .memberships
                .resync(&promotion_id(promo_id)?)
                .await
                .map_err(|error| describe("failed to resync memberships", &error))?;

            println!("rows_written: {written}");
        }
    }

    Ok(())
}
