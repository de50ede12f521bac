//! Error types for the migration runtime.

use oxide_schema_core::{ParseError, SchemaError};

/// Errors that can occur while migrating a database.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The schema definition is invalid.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Database error during execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (reading/writing snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A driver rejected a statement.
    #[error("Driver error: {0}")]
    Driver(String),

    /// A stored table definition could not be parsed back.
    #[error("Failed to introspect '{table}': {source}")]
    Introspection {
        /// Table or index name.
        table: String,
        /// Parser failure.
        source: ParseError,
    },

    /// The store returned something inconsistent.
    #[error("Invalid migration state: {0}")]
    InvalidState(String),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
