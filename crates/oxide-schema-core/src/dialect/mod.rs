//! Database dialect implementations.
//!
//! A dialect supplies the type vocabulary used by the column builder, how
//! auto-increment columns are rendered, which alterations the backend can
//! perform after creation, and the DDL for the metadata table.

mod postgres;
mod sqlite;

use std::fmt;
use std::sync::Arc;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::model::Column;

/// Logical column types exposed by the builder DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 16-bit integer.
    SmallInt,
    /// 8-bit integer.
    TinyInt,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Bounded string.
    Varchar(u32),
    /// Unbounded string.
    Text,
    /// JSON document.
    Json,
    /// Boolean flag.
    Boolean,
    /// Date and time without zone.
    Timestamp,
}

/// What a dialect can change on an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AlterPolicy {
    /// Type, nullability and default of existing columns can be altered.
    pub alter_columns: bool,
    /// Constraints can be added, dropped and re-added after creation.
    pub alter_constraints: bool,
    /// Several clauses may share one `ALTER TABLE` statement.
    pub multi_clause_alter: bool,
}

/// Trait for backend-specific SQL rendering.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the native type name for a logical column type.
    fn type_name(&self, column_type: ColumnType) -> String;

    /// Returns the stored form of a raw type name given to the builder.
    ///
    /// The default keeps the name as written.
    fn canonical_type(&self, data_type: &str) -> String {
        data_type.to_string()
    }

    /// Returns what this dialect can alter after creation.
    fn alter_policy(&self) -> AlterPolicy;

    /// Returns the DDL creating the snapshot metadata table if absent.
    fn metadata_table_sql(&self, table: &str) -> String;

    /// Returns the type rendered in a column definition.
    ///
    /// The default is the stored data type; dialects with a dedicated
    /// auto-increment type override this.
    fn column_type(&self, column: &Column) -> String {
        column.data_type().to_string()
    }

    /// Returns `true` if auto-increment is implied by the primary key
    /// rather than declared, as with SQLite's rowid alias.
    fn auto_increment_is_rowid(&self) -> bool {
        false
    }

    /// Quotes an identifier. Names are wrapped verbatim, no escaping.
    fn quote(&self, name: &str) -> String {
        format!("\"{name}\"")
    }
}

/// Looks up a dialect by name (`postgres`, `postgresql` or `sqlite`).
#[must_use]
pub fn dialect_by_name(name: &str) -> Option<Arc<dyn Dialect>> {
    match name.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Some(Arc::new(PostgresDialect::new())),
        "sqlite" | "sqlite3" => Some(Arc::new(SqliteDialect::new())),
        _ => None,
    }
}

// ============================================================================
// Capability warnings
// ============================================================================

/// A change the dialect cannot apply to an existing object.
///
/// The offending clause is left out of the generated SQL; the warning is
/// logged and reported so callers can see the partial application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityWarning {
    /// A column's type changed.
    ColumnType {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Previous type.
        from: String,
        /// Desired type.
        to: String,
    },
    /// A column's nullability changed.
    Nullability {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Desired nullability.
        nullable: bool,
    },
    /// A column's default changed.
    Default {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Previous default.
        from: Option<String>,
        /// Desired default.
        to: Option<String>,
    },
    /// A column's auto-increment flag changed.
    AutoIncrement {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Desired flag.
        auto_increment: bool,
    },
    /// A constraint was added, dropped or changed after creation.
    Constraint {
        /// Table name.
        table: String,
        /// Constraint name.
        constraint: String,
        /// `add`, `drop` or `alter`.
        action: &'static str,
    },
}

impl CapabilityWarning {
    /// Returns the table the warning is about.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::ColumnType { table, .. }
            | Self::Nullability { table, .. }
            | Self::Default { table, .. }
            | Self::AutoIncrement { table, .. }
            | Self::Constraint { table, .. } => table,
        }
    }
}

impl fmt::Display for CapabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnType {
                table,
                column,
                from,
                to,
            } => write!(
                f,
                "Cannot change type of {table}.{column} from {from} to {to}"
            ),
            Self::Nullability {
                table,
                column,
                nullable,
            } => {
                let state = if *nullable { "NULL" } else { "NOT NULL" };
                write!(f, "Cannot make {table}.{column} {state}")
            }
            Self::Default {
                table,
                column,
                from,
                to,
            } => write!(
                f,
                "Cannot change default of {table}.{column} from {} to {}",
                from.as_deref().unwrap_or("none"),
                to.as_deref().unwrap_or("none")
            ),
            Self::AutoIncrement {
                table,
                column,
                auto_increment,
            } => {
                let verb = if *auto_increment { "enable" } else { "disable" };
                write!(f, "Cannot {verb} auto-increment on {table}.{column}")
            }
            Self::Constraint {
                table,
                constraint,
                action,
            } => write!(
                f,
                "Cannot {action} constraint {constraint} on existing table {table}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_by_name() {
        assert_eq!(dialect_by_name("sqlite").map(|d| d.name()), Some("sqlite"));
        assert_eq!(
            dialect_by_name("PostgreSQL").map(|d| d.name()),
            Some("postgres")
        );
        assert!(dialect_by_name("oracle").is_none());
    }

    #[test]
    fn test_varchar_coercion() {
        let sqlite = SqliteDialect::new();
        let postgres = PostgresDialect::new();

        assert_eq!(sqlite.type_name(ColumnType::Varchar(16)), "TEXT");
        assert_eq!(postgres.type_name(ColumnType::Varchar(16)), "VARCHAR(16)");
    }

    #[test]
    fn test_warning_display() {
        let warning = CapabilityWarning::ColumnType {
            table: "user".into(),
            column: "age".into(),
            from: "INTEGER".into(),
            to: "TEXT".into(),
        };
        assert_eq!(
            warning.to_string(),
            "Cannot change type of user.age from INTEGER to TEXT"
        );
        assert_eq!(warning.table(), "user");
    }
}
