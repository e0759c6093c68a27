use clap::{Args, Subcommand};
use promocat_app::{config::StoreConfig, store::cassandra::schema::apply_schema};

use super::describe;

#[derive(Debug, Args)]
pub(crate) struct SchemaCommand {
    #[command(subcommand)]
    command: SchemaSubcommand,
}

#[derive(Debug, Subcommand)]
enum SchemaSubcommand {
    /// Create the keyspace, tables and views when missing
    Apply {
        /// Replication factor for a newly created keyspace
        #[arg(long, default_value_t = 1)]
        replication_factor: u32,
    },
}

pub(crate) async fn run(command: SchemaCommand, store: &StoreConfig) -> Result<(), String> {
    match command.command {
        SchemaSubcommand::Apply { replication_factor } => {
            apply_schema(store, replication_factor)
                .await
                .map_err(|error| describe("failed to apply schema", &error))?;

            println!("schema applied to keyspace {}", store.keyspace);

            Ok(())
        }
    }
}
