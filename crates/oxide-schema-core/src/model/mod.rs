//! Schema entity model.
//!
//! Columns and constraints belong to a table; tables and indexes are the
//! top-level entities compared against a snapshot. The same types are
//! serialized as the persisted descriptors.

mod column;
mod constraint;
mod index;
mod table;

pub use column::Column;
pub use constraint::Constraint;
pub use index::Index;
pub use table::Table;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::item::{AlterContext, Diffable, Item, Named};

/// A top-level schema entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__type", rename_all = "lowercase")]
pub enum Entity {
    /// A table.
    Table(Table),
    /// An index.
    Index(Index),
}

impl Entity {
    /// Returns `"table"` or `"index"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Index(_) => "index",
        }
    }

    /// Returns the table, if this entity is one.
    #[must_use]
    pub const fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::Index(_) => None,
        }
    }

    /// Returns the index, if this entity is one.
    #[must_use]
    pub const fn as_index(&self) -> Option<&Index> {
        match self {
            Self::Index(index) => Some(index),
            Self::Table(_) => None,
        }
    }

    /// Returns the statement removing this entity.
    #[must_use]
    pub fn drop_sql(&self, dialect: &dyn Dialect) -> String {
        match self {
            Self::Table(table) => table.drop_sql(dialect),
            Self::Index(index) => index.drop_sql(dialect),
        }
    }

    /// Returns `true` if both entities are of the same kind.
    #[must_use]
    pub const fn same_kind(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Table(_), Self::Table(_)) | (Self::Index(_), Self::Index(_))
        )
    }
}

impl From<Table> for Entity {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<Index> for Entity {
    fn from(index: Index) -> Self {
        Self::Index(index)
    }
}

impl Named for Entity {
    fn name(&self) -> &str {
        match self {
            Self::Table(table) => table.name(),
            Self::Index(index) => index.name(),
        }
    }
}

impl Diffable for Entity {
    type Descriptor = Self;

    fn is_changed(&self, prior: &Self) -> bool {
        match (self, prior) {
            (Self::Table(table), Self::Table(old)) => table.is_changed(old),
            (Self::Index(index), Self::Index(old)) => index.is_changed(old),
            _ => true,
        }
    }

    fn rename_from(&self) -> Option<&str> {
        match self {
            Self::Table(table) => table.rename_from(),
            Self::Index(index) => index.rename_from(),
        }
    }
}

impl Item for Entity {
    fn create_sql(&self, dialect: &dyn Dialect) -> String {
        match self {
            Self::Table(table) => table.create_sql(dialect),
            Self::Index(index) => index.create_sql(dialect),
        }
    }

    fn alter_sql(&self, prior: &Self, ctx: &mut AlterContext<'_>) -> Vec<String> {
        match (self, prior) {
            (Self::Table(table), Self::Table(old)) => table.alter_sql(old, ctx),
            (Self::Index(index), Self::Index(old)) => index.alter_sql(old, ctx),
            // Kind changes are a drop plus a create, planned by the caller.
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqliteDialect;

    #[test]
    fn test_entity_tag() {
        let entity = Entity::from(Table::new("user"));
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["__type"], "table");

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);

        let index: Entity = serde_json::from_str(
            r#"{"__type":"index","name":"i","table":"t","columns":["a"]}"#,
        )
        .unwrap();
        assert_eq!(index.kind(), "index");
    }

    #[test]
    fn test_kind_mismatch_is_not_altered() {
        let dialect = SqliteDialect::new();
        let prior = Entity::from(Index::new("thing").on("t", ["a"]));
        let desired = Entity::from(Table::new("thing").with_column(Column::new("a", "TEXT")));

        assert!(desired.is_changed(&prior));
        assert!(!desired.same_kind(&prior));
        let mut warnings = Vec::new();
        let mut ctx = AlterContext::new(&dialect, "", &mut warnings);
        assert!(desired.alter_sql(&prior, &mut ctx).is_empty());
    }
}
