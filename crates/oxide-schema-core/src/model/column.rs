//! Table columns.

use serde::{Deserialize, Serialize};

use crate::descriptor::flexible_bool;
use crate::dialect::{CapabilityWarning, Dialect};
use crate::item::{AlterContext, Diffable, Item, Named};

/// A column owned by exactly one table.
///
/// The data type is a dialect-native string: builder methods resolve it
/// through the dialect's vocabulary, raw types pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    name: String,
    data_type: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    nullable: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<String>,
    #[serde(skip)]
    rename_from: Option<String>,
}

impl Column {
    /// Creates a non-nullable column without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: false,
            auto_increment: false,
            default_value: None,
            rename_from: None,
        }
    }

    /// Sets nullability.
    #[must_use]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the auto-increment flag.
    #[must_use]
    pub const fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Sets the raw SQL default.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Returns the stored data type.
    #[must_use]
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Returns whether the column accepts NULL.
    #[must_use]
    pub const fn nullable(&self) -> bool {
        self.nullable
    }

    /// Returns whether the column is auto-incremented.
    #[must_use]
    pub const fn auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Returns the raw SQL default, treating an empty string as absent.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref().filter(|v| !v.is_empty())
    }

    pub(crate) fn set_data_type(&mut self, data_type: String) {
        self.data_type = data_type;
    }

    pub(crate) fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    pub(crate) fn set_auto_increment(&mut self, auto_increment: bool) {
        self.auto_increment = auto_increment;
    }

    pub(crate) fn set_default(&mut self, value: String) {
        self.default_value = Some(value);
    }

    pub(crate) fn set_rename_from(&mut self, old: String) {
        self.rename_from = Some(old);
    }

    fn type_changed(&self, prior: &Self) -> bool {
        !self.data_type.eq_ignore_ascii_case(&prior.data_type)
    }

    fn default_changed(&self, prior: &Self) -> bool {
        self.default_value() != prior.default_value()
    }
}

impl Named for Column {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Diffable for Column {
    type Descriptor = Self;

    fn is_changed(&self, prior: &Self) -> bool {
        self.type_changed(prior)
            || self.nullable != prior.nullable
            || self.auto_increment != prior.auto_increment
            || self.default_changed(prior)
    }

    fn rename_from(&self) -> Option<&str> {
        self.rename_from.as_deref()
    }
}

impl Item for Column {
    fn create_sql(&self, dialect: &dyn Dialect) -> String {
        let mut sql = format!(
            "{} {} {}",
            dialect.quote(&self.name),
            dialect.column_type(self),
            if self.nullable { "NULL" } else { "NOT NULL" }
        );
        if let Some(value) = self.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(value);
        }
        sql
    }

    fn alter_sql(&self, prior: &Self, ctx: &mut AlterContext<'_>) -> Vec<String> {
        let dialect = ctx.dialect();
        let policy = dialect.alter_policy();
        let quoted = dialect.quote(&self.name);
        let table = ctx.table().to_string();
        let mut clauses = Vec::new();

        if self.type_changed(prior) {
            if policy.alter_columns {
                clauses.push(format!("ALTER COLUMN {quoted} TYPE {}", self.data_type));
            } else {
                ctx.warn(CapabilityWarning::ColumnType {
                    table: table.clone(),
                    column: self.name.clone(),
                    from: prior.data_type.clone(),
                    to: self.data_type.clone(),
                });
            }
        }

        if self.nullable != prior.nullable {
            if policy.alter_columns {
                let action = if self.nullable {
                    "DROP NOT NULL"
                } else {
                    "SET NOT NULL"
                };
                clauses.push(format!("ALTER COLUMN {quoted} {action}"));
            } else {
                ctx.warn(CapabilityWarning::Nullability {
                    table: table.clone(),
                    column: self.name.clone(),
                    nullable: self.nullable,
                });
            }
        }

        if self.default_changed(prior) {
            if policy.alter_columns {
                clauses.push(match self.default_value() {
                    Some(value) => format!("ALTER COLUMN {quoted} SET DEFAULT {value}"),
                    None => format!("ALTER COLUMN {quoted} DROP DEFAULT"),
                });
            } else {
                ctx.warn(CapabilityWarning::Default {
                    table: table.clone(),
                    column: self.name.clone(),
                    from: prior.default_value().map(String::from),
                    to: self.default_value().map(String::from),
                });
            }
        }

        // No dialect can toggle auto-increment on an existing column.
        if self.auto_increment != prior.auto_increment {
            ctx.warn(CapabilityWarning::AutoIncrement {
                table,
                column: self.name.clone(),
                auto_increment: self.auto_increment,
            });
        }

        clauses
    }
}
