//! Error types for schema definition.

use crate::catalog::ParseError;

/// Errors raised while a schema is being defined or reconstructed.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A foreign key points at a column the referenced table does not have.
    #[error("Invalid column reference {table}.{column} from {from_table}.{from_column}")]
    InvalidReference {
        /// Referenced table.
        table: String,
        /// Referenced column.
        column: String,
        /// Table declaring the reference.
        from_table: String,
        /// Column declaring the reference.
        from_column: String,
    },

    /// An index lists a column its table does not have.
    #[error("Index '{index}' references unknown column {table}.{column}")]
    UnknownIndexColumn {
        /// Index name.
        index: String,
        /// Indexed table.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A primary key lists a column the table does not have.
    #[error("Primary key of '{table}' references unknown column '{column}'")]
    UnknownKeyColumn {
        /// Table name.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A table handle from another schema was passed to a builder.
    #[error("Table handle {0} does not belong to this schema")]
    ForeignTableHandle(String),

    /// An index was declared but never attached to a table.
    #[error("Index '{0}' is not attached to a table or has no columns")]
    IncompleteIndex(String),

    /// A column name appears twice in one table.
    #[error("Column '{column}' is defined twice on table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Duplicated column name.
        column: String,
    },

    /// Two top-level entities share a name.
    #[error("Entity '{0}' is defined more than once")]
    DuplicateEntity(String),

    /// A seed record could not be turned into an INSERT.
    #[error("Invalid seed record for table '{table}': {message}")]
    InvalidRecord {
        /// Target table.
        table: String,
        /// What was wrong with the record.
        message: String,
    },

    /// Stored catalog text could not be parsed back into a descriptor.
    #[error("Catalog parse error: {0}")]
    Parse(#[from] ParseError),

    /// Snapshot or descriptor JSON was malformed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
