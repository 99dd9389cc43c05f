//! Count command implementation
//!
//! This module implements the `count` command for sizing a collection
//! through a declared connection, the same way a copy sizes its source.

use clap::Args;

use crate::adapters::StoreFactory;
use crate::config::load_config;
use crate::domain::CollectionRef;

/// Arguments for the count command
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Connection name (declared under `[connections]`)
    #[arg(long, value_name = "NAME")]
    pub connection: String,

    /// Database name
    #[arg(long, value_name = "DATABASE")]
    pub database: String,

    /// Collection name
    #[arg(long, value_name = "COLLECTION")]
    pub collection: String,
}

impl CountArgs {
    /// Execute the count command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting count command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let collection = CollectionRef::new(&self.connection, &self.database, &self.collection);
        if let Err(e) = collection.validate() {
            eprintln!("Invalid collection reference: {e}");
            return Ok(2);
        }

        let connection = match config.connection(&self.connection) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let factory = StoreFactory::new();
        let reader = factory.reader(connection, &collection);

        match reader.count_documents().await {
            Ok(count) => {
                tracing::info!(collection = %collection, count, "Counted collection");
                println!(
                    "📊 {collection}: {count} document{}",
                    if count == 1 { "" } else { "s" }
                );
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, collection = %collection, "Count failed");
                eprintln!("Could not size the collection: {e}");
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_args_creation() {
        let args = CountArgs {
            connection: "archive".to_string(),
            database: "appdb".to_string(),
            collection: "users".to_string(),
        };
        assert_eq!(args.connection, "archive");
    }

    #[tokio::test]
    async fn test_count_rejects_missing_config() {
        let args = CountArgs {
            connection: "archive".to_string(),
            database: "appdb".to_string(),
            collection: "users".to_string(),
        };
        let exit = args.execute("no-such-docferry.toml").await.unwrap();
        assert_eq!(exit, 2);
    }
}
