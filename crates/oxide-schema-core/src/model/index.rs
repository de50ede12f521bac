//! Secondary indexes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::descriptor::flexible_bool;
use crate::dialect::Dialect;
use crate::item::{AlterContext, Diffable, Item, Named};

/// An index over columns of a single table.
///
/// Changing an index is always a drop followed by a re-create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    name: String,
    #[serde(rename = "isCheckPoint", default, deserialize_with = "flexible_bool")]
    checkpoint: bool,
    #[serde(rename = "isUnique", default, deserialize_with = "flexible_bool")]
    unique: bool,
    #[serde(default)]
    table: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(skip)]
    rename_from: Option<String>,
}

impl Index {
    /// Creates an index that is not yet attached to a table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checkpoint: false,
            unique: false,
            table: String::new(),
            columns: Vec::new(),
            rename_from: None,
        }
    }

    /// Attaches the index to `table` over `columns`.
    #[must_use]
    pub fn on<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attach(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the unique flag.
    #[must_use]
    pub const fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Returns the indexed table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the indexed columns in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns whether the index is unique.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the checkpoint hint.
    #[must_use]
    pub const fn is_checkpoint(&self) -> bool {
        self.checkpoint
    }

    pub(crate) fn attach(&mut self, table: String, columns: Vec<String>) {
        self.table = table;
        self.columns = columns;
    }

    pub(crate) fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    pub(crate) fn set_checkpoint(&mut self, checkpoint: bool) {
        self.checkpoint = checkpoint;
    }

    pub(crate) fn set_rename_from(&mut self, old: String) {
        self.rename_from = Some(old);
    }

    /// Returns `DROP INDEX "<name>"`.
    #[must_use]
    pub fn drop_sql(&self, dialect: &dyn Dialect) -> String {
        format!("DROP INDEX {}", dialect.quote(&self.name))
    }
}

impl Named for Index {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Diffable for Index {
    type Descriptor = Self;

    fn is_changed(&self, prior: &Self) -> bool {
        if self.unique != prior.unique
            || self.columns.len() != prior.columns.len()
            || self.table != prior.table
        {
            return true;
        }
        let old: HashSet<&str> = prior.columns.iter().map(String::as_str).collect();
        self.columns.iter().any(|c| !old.contains(c.as_str()))
    }

    fn rename_from(&self) -> Option<&str> {
        self.rename_from.as_deref()
    }
}

impl Item for Index {
    fn create_sql(&self, dialect: &dyn Dialect) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| dialect.quote(c)).collect();
        format!(
            "CREATE {}INDEX {} ON {}({})",
            if self.unique { "UNIQUE " } else { "" },
            dialect.quote(&self.name),
            dialect.quote(&self.table),
            columns.join(",")
        )
    }

    /// Emits only the drop; the planner queues [`Item::create_sql`] next.
    fn alter_sql(&self, prior: &Self, ctx: &mut AlterContext<'_>) -> Vec<String> {
        if self.is_changed(prior) {
            vec![prior.drop_sql(ctx.dialect())]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;

    #[test]
    fn test_create_sql() {
        let dialect = SqliteDialect::new();
        let index = Index::new("idx_book_title").on("book", ["title", "year"]);
        assert_eq!(
            index.create_sql(&dialect),
            "CREATE INDEX \"idx_book_title\" ON \"book\"(\"title\",\"year\")"
        );

        let unique = Index::new("ux_user_email")
            .on("user", ["email"])
            .with_unique(true);
        assert_eq!(
            unique.create_sql(&dialect),
            "CREATE UNIQUE INDEX \"ux_user_email\" ON \"user\"(\"email\")"
        );
    }

    #[test]
    fn test_column_order_is_ignored() {
        let a = Index::new("i").on("t", ["x", "y"]);
        let b = Index::new("i").on("t", ["y", "x"]);
        assert!(!a.is_changed(&b));
    }

    #[test]
    fn test_changes() {
        let base = Index::new("i").on("t", ["x"]);
        assert!(base.clone().with_unique(true).is_changed(&base));
        assert!(Index::new("i").on("t", ["x", "y"]).is_changed(&base));
        assert!(Index::new("i").on("t", ["z"]).is_changed(&base));
        assert!(Index::new("i").on("u", ["x"]).is_changed(&base));
    }

    #[test]
    fn test_alter_is_drop() {
        let dialect = SqliteDialect::new();
        let prior = Index::new("i").on("t", ["x"]);
        let desired = Index::new("i").on("t", ["y"]);

        let mut warnings = Vec::new();
        let mut ctx = AlterContext::new(&dialect, "", &mut warnings);
        assert_eq!(desired.alter_sql(&prior, &mut ctx), vec!["DROP INDEX \"i\""]);
    }

    #[test]
    fn test_loose_descriptor() {
        let index: Index = serde_json::from_str(
            r#"{"name":"i","isCheckPoint":1,"isUnique":0,"table":"t","columns":["x"]}"#,
        )
        .unwrap();
        assert!(index.is_checkpoint());
        assert!(!index.is_unique());
    }
}
