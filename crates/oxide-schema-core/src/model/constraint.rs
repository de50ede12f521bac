//! Table-level constraints.

use serde::{Deserialize, Serialize};

use crate::dialect::{CapabilityWarning, Dialect};
use crate::item::{AlterContext, Diffable, Item, Named};

/// A named table constraint.
///
/// Constraints are never altered in place: a change drops the old
/// constraint by name and adds the new definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Constraint {
    /// Primary key over one or more columns.
    PrimaryKey {
        /// Constraint name.
        name: String,
        /// Key columns in order.
        columns: Vec<String>,
    },
    /// Uniqueness of a single column.
    UniqueKey {
        /// Constraint name.
        name: String,
        /// Unique column.
        column: String,
    },
    /// Reference from a column to a column of another table.
    ForeignKey {
        /// Constraint name.
        name: String,
        /// Referencing column.
        column: String,
        /// Referenced table.
        ref_table: String,
        /// Referenced column.
        ref_column: String,
    },
}

impl Constraint {
    /// Creates the primary key `PK_<table>`.
    pub fn primary_key<I, S>(table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PrimaryKey {
            name: format!("PK_{table}"),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates the unique key `UK_<table>_<column>`.
    pub fn unique_key(table: &str, column: impl Into<String>) -> Self {
        let column = column.into();
        Self::UniqueKey {
            name: format!("UK_{table}_{column}"),
            column,
        }
    }

    /// Creates the foreign key `FK_<table>_<ref_table>_<column>`.
    pub fn foreign_key(
        table: &str,
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        let column = column.into();
        let ref_table = ref_table.into();
        Self::ForeignKey {
            name: format!("FK_{table}_{ref_table}_{column}"),
            column,
            ref_table,
            ref_column: ref_column.into(),
        }
    }

    /// Returns the local columns the constraint covers.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Self::PrimaryKey { columns, .. } => columns.iter().map(String::as_str).collect(),
            Self::UniqueKey { column, .. } | Self::ForeignKey { column, .. } => vec![column.as_str()],
        }
    }

    /// Returns `DROP CONSTRAINT "<name>"`.
    #[must_use]
    pub fn drop_sql(&self, dialect: &dyn Dialect) -> String {
        format!("DROP CONSTRAINT {}", dialect.quote(self.name()))
    }
}

impl Named for Constraint {
    fn name(&self) -> &str {
        match self {
            Self::PrimaryKey { name, .. }
            | Self::UniqueKey { name, .. }
            | Self::ForeignKey { name, .. } => name,
        }
    }
}

impl Diffable for Constraint {
    type Descriptor = Self;

    fn is_changed(&self, prior: &Self) -> bool {
        self != prior
    }
}

impl Item for Constraint {
    fn create_sql(&self, dialect: &dyn Dialect) -> String {
        let body = match self {
            Self::PrimaryKey { columns, .. } => {
                let quoted: Vec<String> = columns.iter().map(|c| dialect.quote(c)).collect();
                format!("PRIMARY KEY({})", quoted.join(", "))
            }
            Self::UniqueKey { column, .. } => format!("UNIQUE({})", dialect.quote(column)),
            Self::ForeignKey {
                column,
                ref_table,
                ref_column,
                ..
            } => format!(
                "FOREIGN KEY({}) REFERENCES {}({})",
                dialect.quote(column),
                dialect.quote(ref_table),
                dialect.quote(ref_column)
            ),
        };
        format!("CONSTRAINT {} {body}", dialect.quote(self.name()))
    }

    fn alter_sql(&self, prior: &Self, ctx: &mut AlterContext<'_>) -> Vec<String> {
        if !self.is_changed(prior) {
            return Vec::new();
        }
        let dialect = ctx.dialect();
        if !dialect.alter_policy().alter_constraints {
            let table = ctx.table().to_string();
            ctx.warn(CapabilityWarning::Constraint {
                table,
                constraint: self.name().to_string(),
                action: "alter",
            });
            return Vec::new();
        }
        vec![
            prior.drop_sql(dialect),
            format!("ADD {}", self.create_sql(dialect)),
        ]
    }
}
