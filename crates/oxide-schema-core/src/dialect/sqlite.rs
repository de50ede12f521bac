//! SQLite dialect.
//!
//! SQLite only supports adding and dropping columns on existing tables.
//! Column type, nullability and default changes, and any constraint change
//! after creation, are reported as capability warnings instead of SQL.
//! Each `ALTER TABLE` statement carries exactly one clause.
//!
//! Raw type names collapse to their column affinity (`INTEGER`, `TEXT`,
//! `BLOB`, `REAL` or `NUMERIC`), the form the catalog gives back.

use super::{AlterPolicy, ColumnType, Dialect};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn type_name(&self, column_type: ColumnType) -> String {
        match column_type {
            ColumnType::Int
            | ColumnType::BigInt
            | ColumnType::SmallInt
            | ColumnType::TinyInt
            | ColumnType::Boolean => "INTEGER",
            ColumnType::Float | ColumnType::Double => "REAL",
            ColumnType::Varchar(_) | ColumnType::Text | ColumnType::Json | ColumnType::Timestamp => {
                "TEXT"
            }
        }
        .to_string()
    }

    fn canonical_type(&self, data_type: &str) -> String {
        let upper = data_type.to_ascii_uppercase();
        let has = |keys: &[&str]| keys.iter().any(|k| upper.contains(k));
        if has(&["INT"]) {
            "INTEGER"
        } else if has(&["CHAR", "CLOB", "TEXT"]) {
            "TEXT"
        } else if has(&["BLOB"]) || upper.trim().is_empty() {
            "BLOB"
        } else if has(&["REAL", "FLOA", "DOUB"]) {
            "REAL"
        } else {
            "NUMERIC"
        }
        .to_string()
    }

    fn alter_policy(&self) -> AlterPolicy {
        AlterPolicy {
            alter_columns: false,
            alter_constraints: false,
            multi_clause_alter: false,
        }
    }

    fn auto_increment_is_rowid(&self) -> bool {
        true
    }

    fn metadata_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {}(id INTEGER PRIMARY KEY AUTOINCREMENT, timestamp INTEGER NOT NULL, entities TEXT, records TEXT)",
            self.quote(table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    #[test]
    fn test_integer_widths_collapse() {
        let dialect = SqliteDialect::new();
        for ty in [
            ColumnType::Int,
            ColumnType::BigInt,
            ColumnType::SmallInt,
            ColumnType::TinyInt,
            ColumnType::Boolean,
        ] {
            assert_eq!(dialect.type_name(ty), "INTEGER");
        }
        assert_eq!(dialect.type_name(ColumnType::Double), "REAL");
        assert_eq!(dialect.type_name(ColumnType::Json), "TEXT");
        assert_eq!(dialect.type_name(ColumnType::Timestamp), "TEXT");
    }

    #[test]
    fn test_raw_types_collapse_to_affinity() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.canonical_type("NUMERIC(10,2)"), "NUMERIC");
        assert_eq!(dialect.canonical_type("decimal(5)"), "NUMERIC");
        assert_eq!(dialect.canonical_type("DATETIME"), "NUMERIC");
        assert_eq!(dialect.canonical_type("VARCHAR(16)"), "TEXT");
        assert_eq!(dialect.canonical_type("character varying"), "TEXT");
        assert_eq!(dialect.canonical_type("UNSIGNED BIG INT"), "INTEGER");
        assert_eq!(dialect.canonical_type("double precision"), "REAL");
        assert_eq!(dialect.canonical_type("blob"), "BLOB");
    }

    #[test]
    fn test_auto_increment_is_rowid_alias() {
        let dialect = SqliteDialect::new();
        let id = Column::new("id", "INTEGER").with_auto_increment(true);
        assert_eq!(dialect.column_type(&id), "INTEGER");
    }

    #[test]
    fn test_metadata_table_sql() {
        let sql = SqliteDialect::new().metadata_table_sql("migration");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"migration\"("));
    }
}
