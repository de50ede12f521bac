//! Tables.

use serde::{Deserialize, Serialize};

use super::{Column, Constraint};
use crate::descriptor::flexible_bool;
use crate::diff::partition;
use crate::dialect::{CapabilityWarning, Dialect};
use crate::item::{AlterContext, Diffable, Item, Named};

/// A table with ordered columns and constraints.
///
/// Declaration order is DDL order for both lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    name: String,
    #[serde(rename = "isCheckPoint", default, deserialize_with = "flexible_bool")]
    checkpoint: bool,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default)]
    constraints: Vec<Constraint>,
    #[serde(skip)]
    rename_from: Option<String>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checkpoint: false,
            columns: Vec::new(),
            constraints: Vec::new(),
            rename_from: None,
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends a constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Looks up a constraint by name.
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name() == name)
    }

    /// Returns the primary key, if declared.
    #[must_use]
    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|c| matches!(c, Constraint::PrimaryKey { .. }))
    }

    /// Returns the column aliasing SQLite's rowid: the sole column of the
    /// primary key, declared exactly `INTEGER`.
    #[must_use]
    pub fn rowid_alias(&self) -> Option<&str> {
        match self.primary_key() {
            Some(Constraint::PrimaryKey { columns, .. }) if columns.len() == 1 => self
                .column(&columns[0])
                .filter(|c| c.data_type().eq_ignore_ascii_case("INTEGER"))
                .map(Named::name),
            _ => None,
        }
    }

    /// Makes the rowid alias the only auto-incremented column.
    pub(crate) fn normalize_rowid_alias(&mut self) {
        let alias = self.rowid_alias().map(str::to_string);
        for column in &mut self.columns {
            let is_alias = alias.as_deref() == Some(column.name());
            column.set_auto_increment(is_alias);
        }
    }

    /// Returns the checkpoint hint.
    #[must_use]
    pub const fn is_checkpoint(&self) -> bool {
        self.checkpoint
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    pub(crate) fn constraints_mut(&mut self) -> &mut Vec<Constraint> {
        &mut self.constraints
    }

    pub(crate) fn set_checkpoint(&mut self, checkpoint: bool) {
        self.checkpoint = checkpoint;
    }

    pub(crate) fn set_rename_from(&mut self, old: String) {
        self.rename_from = Some(old);
    }

    /// Returns `DROP TABLE "<name>"`.
    #[must_use]
    pub fn drop_sql(&self, dialect: &dyn Dialect) -> String {
        format!("DROP TABLE {}", dialect.quote(&self.name))
    }
}

impl Named for Table {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Diffable for Table {
    type Descriptor = Self;

    fn is_changed(&self, prior: &Self) -> bool {
        self.columns.len() != prior.columns.len()
            || self.constraints.len() != prior.constraints.len()
            || self
                .columns
                .iter()
                .any(|c| prior.column(c.name()).is_none_or(|p| c.is_changed(p)))
            || self
                .constraints
                .iter()
                .any(|c| prior.constraint(c.name()).is_none_or(|p| c.is_changed(p)))
    }

    fn rename_from(&self) -> Option<&str> {
        self.rename_from.as_deref()
    }
}

impl Item for Table {
    fn create_sql(&self, dialect: &dyn Dialect) -> String {
        let definitions: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.create_sql(dialect))
            .chain(self.constraints.iter().map(|c| c.create_sql(dialect)))
            .collect();
        format!(
            "CREATE TABLE {}({})",
            dialect.quote(&self.name),
            definitions.join(", ")
        )
    }

    fn alter_sql(&self, prior: &Self, ctx: &mut AlterContext<'_>) -> Vec<String> {
        if !self.is_changed(prior) {
            return Vec::new();
        }
        let dialect = ctx.dialect();
        let policy = dialect.alter_policy();
        let mut ctx = ctx.scoped(&self.name);
        let mut clauses = Vec::new();

        let columns = partition(&self.columns, &prior.columns);
        for column in columns.create {
            clauses.push(format!("ADD {}", column.create_sql(dialect)));
        }
        for (column, old) in columns.alter {
            clauses.extend(column.alter_sql(old, &mut ctx));
        }
        for column in columns.drop {
            clauses.push(format!("DROP COLUMN {}", dialect.quote(column.name())));
        }

        let constraints = partition(&self.constraints, &prior.constraints);
        for constraint in constraints.create {
            if policy.alter_constraints {
                clauses.push(format!("ADD {}", constraint.create_sql(dialect)));
            } else {
                ctx.warn(CapabilityWarning::Constraint {
                    table: self.name.clone(),
                    constraint: constraint.name().to_string(),
                    action: "add",
                });
            }
        }
        for (constraint, old) in constraints.alter {
            clauses.extend(constraint.alter_sql(old, &mut ctx));
        }
        for constraint in constraints.drop {
            if policy.alter_constraints {
                clauses.push(constraint.drop_sql(dialect));
            } else {
                ctx.warn(CapabilityWarning::Constraint {
                    table: self.name.clone(),
                    constraint: constraint.name().to_string(),
                    action: "drop",
                });
            }
        }

        if clauses.is_empty() {
            return Vec::new();
        }
        let table = dialect.quote(&self.name);
        if policy.multi_clause_alter {
            vec![format!("ALTER TABLE {table} {}", clauses.join(", "))]
        } else {
            clauses
                .into_iter()
                .map(|clause| format!("ALTER TABLE {table} {clause}"))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqliteDialect};

    fn user_table() -> Table {
        Table::new("user")
            .with_column(Column::new("id", "INTEGER").with_auto_increment(true))
            .with_column(Column::new("name", "TEXT"))
            .with_constraint(Constraint::primary_key("user", ["id"]))
    }

    fn alter(table: &Table, prior: &Table, dialect: &dyn Dialect) -> (Vec<String>, usize) {
        let mut warnings = Vec::new();
        let mut ctx = AlterContext::new(dialect, "", &mut warnings);
        let sql = table.alter_sql(prior, &mut ctx);
        (sql, warnings.len())
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            user_table().create_sql(&SqliteDialect::new()),
            "CREATE TABLE \"user\"(\"id\" INTEGER NOT NULL, \"name\" TEXT NOT NULL, CONSTRAINT \"PK_user\" PRIMARY KEY(\"id\"))"
        );
    }

    #[test]
    fn test_unchanged_table_has_no_alter() {
        let table = user_table();
        assert!(!table.is_changed(&table.clone()));
        assert!(alter(&table, &table.clone(), &PostgresDialect::new()).0.is_empty());
    }

    #[test]
    fn test_add_column_sqlite() {
        let prior = user_table();
        let desired = user_table().with_column(Column::new("email", "TEXT"));

        assert!(desired.is_changed(&prior));
        let (sql, warnings) = alter(&desired, &prior, &SqliteDialect::new());
        assert_eq!(sql, vec!["ALTER TABLE \"user\" ADD \"email\" TEXT NOT NULL"]);
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_postgres_joins_clauses() {
        let prior = user_table().with_column(Column::new("legacy", "TEXT"));
        let desired = user_table()
            .with_column(Column::new("email", "VARCHAR(64)"))
            .with_constraint(Constraint::unique_key("user", "email"));

        let (sql, _) = alter(&desired, &prior, &PostgresDialect::new());
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE \"user\" ADD \"email\" VARCHAR(64) NOT NULL, DROP COLUMN \"legacy\", ADD CONSTRAINT \"UK_user_email\" UNIQUE(\"email\")"
            ]
        );
    }

    #[test]
    fn test_sqlite_constraint_changes_warn() {
        let prior = user_table();
        let desired = user_table().with_constraint(Constraint::unique_key("user", "name"));

        let (sql, warnings) = alter(&desired, &prior, &SqliteDialect::new());
        assert!(sql.is_empty());
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_sqlite_one_statement_per_clause() {
        let prior = user_table().with_column(Column::new("legacy", "TEXT"));
        let desired = user_table().with_column(Column::new("email", "TEXT").with_nullable(true));

        let (sql, _) = alter(&desired, &prior, &SqliteDialect::new());
        assert_eq!(
            sql,
            vec![
                "ALTER TABLE \"user\" ADD \"email\" TEXT NULL",
                "ALTER TABLE \"user\" DROP COLUMN \"legacy\"",
            ]
        );
    }

    #[test]
    fn test_descriptor_json_shape() {
        let json = serde_json::to_value(user_table()).unwrap();
        assert_eq!(json["name"], "user");
        assert_eq!(json["isCheckPoint"], false);
        assert_eq!(json["columns"][0]["dataType"], "INTEGER");
        assert_eq!(json["columns"][0]["autoIncrement"], true);
        assert_eq!(json["constraints"][0]["kind"], "primaryKey");
    }
}
