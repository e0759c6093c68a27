use std::error::Error;

use clap::{Parser, Subcommand};
use promocat_app::{
    config::{LoggingConfig, StoreConfig},
    context::AppContext,
    domain::coordinator::CascadePolicy,
    observability,
};

mod days;
mod output;
mod products;
mod promotions;
mod schema;
mod seed;

#[derive(Debug, Parser)]
#[command(name = "promocat-app", about = "Promotion catalog CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(flatten)]
    store: StoreConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage the keyspace schema
    Schema(schema::SchemaCommand),

    #[command(flatten)]
    Connected(ConnectedCommands),
}

/// Commands that run against a connected store.
#[derive(Debug, Subcommand)]
enum ConnectedCommands {
    /// Check the store is reachable
    Health,

    /// Manage promotions
    Promo(promotions::PromoCommand),

    /// Manage promotion memberships
    Products(products::ProductsCommand),

    /// Manage active days
    Days(days::DaysCommand),

    /// Load promotions and memberships from a YAML fixture
    Seed(seed::SeedArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_logging(&self.logging)
            .map_err(|error| describe("failed to initialise logging", &error))?;

        match self.command {
            Commands::Schema(command) => schema::run(command, &self.store).await,
            Commands::Connected(command) => {
                let ctx = AppContext::connect(&self.store, CascadePolicy::default())
                    .await
                    .map_err(|error| describe("failed to connect to store", &error))?;

                let result = command.run(&ctx).await;

                ctx.shutdown();

                result
            }
        }
    }
}

impl ConnectedCommands {
    async fn run(self, ctx: &AppContext) -> Result<(), String> {
        match self {
            Self::Health => health(ctx).await,
            Self::Promo(command) => promotions::run(command, ctx).await,
            Self::Products(command) => products::run(command, ctx).await,
            Self::Days(command) => days::run(command, ctx).await,
            Self::Seed(args) => seed::run(args, ctx).await,
        }
    }
}

async fn health(ctx: &AppContext) -> Result<(), String> {
    let version = ctx
        .healthcheck()
        .await
        .map_err(|error| describe("store health check failed", &error))?;

    println!("status: ok");
    println!("release_version: {version}");

    Ok(())
}

/// Render `error` and its sources on one line.
pub(crate) fn describe(context: &str, error: &(dyn Error + 'static)) -> String {
    let mut message = format!("{context}: {error}");
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn schema_runs_without_a_store_command() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["promocat-app", "schema", "apply"])?;

        assert!(
            matches!(cli.command, Commands::Schema(_)),
            "expected the schema command, got {:?}",
            cli.command
        );

        Ok(())
    }

    #[test]
    fn store_commands_parse_at_the_top_level() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["promocat-app", "health"])?;

        assert!(
            matches!(cli.command, Commands::Connected(ConnectedCommands::Health)),
            "expected the health command, got {:?}",
            cli.command
        );

        let cli = Cli::try_parse_from(["promocat-app", "days", "active", "2025-12-21"])?;

        assert!(
            matches!(cli.command, Commands::Connected(ConnectedCommands::Days(_))),
            "expected the days command, got {:?}",
            cli.command
        );

        Ok(())
    }
}
