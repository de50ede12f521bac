//! Seed records.
//!
//! Each `insert` call on a table becomes one multi-row `INSERT`. Executed
//! statements are remembered in the snapshot by their exact text, so a
//! record set is only inserted once.

use serde_json::{Map, Value};
use tracing::warn;

use crate::dialect::Dialect;
use crate::error::{Result, SchemaError};

/// A multi-row INSERT attached to one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Insertion {
    /// Builds an insertion from a JSON object or an array of objects.
    ///
    /// The first record fixes the column list (in key order). Later records
    /// are projected onto it; missing values become `NULL` and extra keys
    /// are ignored, both with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRecord`] if the value is not an object,
    /// an array of objects, or is empty.
    pub fn from_value(table: impl Into<String>, value: Value) -> Result<Self> {
        let table = table.into();
        let records = match value {
            Value::Object(record) => vec![record],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(SchemaError::InvalidRecord {
                        table: table.clone(),
                        message: format!("expected an object, got {other}"),
                    }),
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(SchemaError::InvalidRecord {
                    table,
                    message: format!("expected an object or array of objects, got {other}"),
                })
            }
        };
        Self::new(table, records)
    }

    /// Builds an insertion from records sharing a column set.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRecord`] if there are no records or the
    /// first record has no fields.
    pub fn new(table: impl Into<String>, records: Vec<Map<String, Value>>) -> Result<Self> {
        let table = table.into();
        let Some(first) = records.first() else {
            return Err(SchemaError::InvalidRecord {
                table,
                message: "no records given".to_string(),
            });
        };
        if first.is_empty() {
            return Err(SchemaError::InvalidRecord {
                table,
                message: "record has no fields".to_string(),
            });
        }
        let columns: Vec<String> = first.keys().cloned().collect();

        let mut rows = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            let missing: Vec<&str> = columns
                .iter()
                .filter(|c| !record.contains_key(c.as_str()))
                .map(String::as_str)
                .collect();
            let extra = record.keys().filter(|k| !columns.contains(k)).count();
            if !missing.is_empty() || extra > 0 {
                warn!(
                    table = %table,
                    record = position,
                    missing = ?missing,
                    extra,
                    "Seed record does not match the first record's columns"
                );
            }
            rows.push(
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            );
        }

        Ok(Self {
            table,
            columns,
            rows,
        })
    }

    /// Returns the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the column list.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders `INSERT INTO "t"("a","b") VALUES(..),(..)`.
    #[must_use]
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| dialect.quote(c)).collect();
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(literal).collect();
                format!("({})", values.join(","))
            })
            .collect();
        format!(
            "INSERT INTO {}({}) VALUES{}",
            dialect.quote(&self.table),
            columns.join(","),
            rows.join(",")
        )
    }
}

/// Renders a JSON value as a SQL literal.
fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_text(s),
        Value::Array(_) | Value::Object(_) => quote_text(&value.to_string()),
    }
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
