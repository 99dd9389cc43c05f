//! Collection addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully-qualified reference to a collection in a configured store.
///
/// A reference names the connection (as declared in configuration), the
/// database within it, and the collection within that database. Two
/// references are the same collection when all three parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    /// Connection name as declared in the `[connections]` configuration table.
    pub connection: String,
    /// Database name within the connection.
    pub database: String,
    /// Collection name within the database.
    pub collection: String,
}

impl CollectionRef {
    /// Creates a reference from its three parts.
    pub fn new(
        connection: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            connection: connection.into(),
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Validates that no part is empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.connection.trim().is_empty() {
            return Err("connection name cannot be empty".to_string());
        }
        if self.database.trim().is_empty() {
            return Err("database name cannot be empty".to_string());
        }
        if self.collection.trim().is_empty() {
            return Err("collection name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.connection, self.database, self.collection
        )
    }
}
