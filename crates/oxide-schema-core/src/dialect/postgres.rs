//! PostgreSQL dialect.
//!
//! PostgreSQL can alter column types, nullability and defaults in place and
//! accepts several comma-separated clauses in one `ALTER TABLE`.

use super::{AlterPolicy, ColumnType, Dialect};
use crate::model::Column;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn type_name(&self, column_type: ColumnType) -> String {
        match column_type {
            ColumnType::Int => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt | ColumnType::TinyInt => "SMALLINT".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Varchar(len) => format!("VARCHAR({len})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    fn alter_policy(&self) -> AlterPolicy {
        AlterPolicy {
            alter_columns: true,
            alter_constraints: true,
            multi_clause_alter: true,
        }
    }

    fn metadata_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {}(id SERIAL NOT NULL PRIMARY KEY, timestamp INT NOT NULL, entities TEXT, records TEXT)",
            self.quote(table)
        )
    }

    fn column_type(&self, column: &Column) -> String {
        if !column.auto_increment() {
            return column.data_type().to_string();
        }
        match column.data_type().to_ascii_uppercase().as_str() {
            "BIGINT" | "INT8" => "BIGSERIAL".to_string(),
            "SMALLINT" | "INT2" => "SMALLSERIAL".to_string(),
            _ => "SERIAL".to_string(),
        }
    }
}
