//! Identity and change-detection contract shared by every schema item.
//!
//! Columns, constraints, tables and indexes all have a name that is unique
//! within their owning scope, may carry an advisory `rename_from` marker, and
//! know how to render their own creation and alteration SQL for a dialect.

use crate::dialect::{CapabilityWarning, Dialect};

/// Anything identified by a name within its scope.
pub trait Named {
    /// Returns the item's name.
    fn name(&self) -> &str;
}

/// A schema item that can be compared against its persisted descriptor.
pub trait Diffable: Named {
    /// The persisted form this item is compared against.
    type Descriptor: Named;

    /// Returns `true` when the item differs structurally from `prior`.
    fn is_changed(&self, prior: &Self::Descriptor) -> bool;

    /// Previous name the item was declared under, if any.
    ///
    /// The marker is recorded but not consumed by the diff: a renamed item
    /// is still dropped and created.
    fn rename_from(&self) -> Option<&str> {
        None
    }
}

/// SQL generation contract for schema items.
pub trait Item: Diffable {
    /// Renders the creation SQL (a fragment for columns and constraints, a
    /// full statement for tables and indexes).
    fn create_sql(&self, dialect: &dyn Dialect) -> String;

    /// Renders the SQL that turns `prior` into `self`.
    ///
    /// Returns nothing when [`Diffable::is_changed`] is `false`.
    fn alter_sql(&self, prior: &Self::Descriptor, ctx: &mut AlterContext<'_>) -> Vec<String>;
}

/// State threaded through `alter_sql` calls.
///
/// Carries the dialect, the name of the table being altered and the list
/// capability warnings are collected into.
pub struct AlterContext<'a> {
    dialect: &'a dyn Dialect,
    table: &'a str,
    warnings: &'a mut Vec<CapabilityWarning>,
}

impl<'a> AlterContext<'a> {
    /// Creates a context for altering items owned by `table`.
    pub fn new(
        dialect: &'a dyn Dialect,
        table: &'a str,
        warnings: &'a mut Vec<CapabilityWarning>,
    ) -> Self {
        Self {
            dialect,
            table,
            warnings,
        }
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Returns the table the altered items belong to.
    #[must_use]
    pub const fn table(&self) -> &str {
        self.table
    }

    /// Reborrows the context for the children of another table.
    pub fn scoped<'b>(&'b mut self, table: &'b str) -> AlterContext<'b> {
        AlterContext {
            dialect: self.dialect,
            table,
            warnings: &mut *self.warnings,
        }
    }

    /// Records a capability warning and logs it.
    pub fn warn(&mut self, warning: CapabilityWarning) {
        tracing::warn!(dialect = self.dialect.name(), "{warning}");
        self.warnings.push(warning);
    }
}
