//! Persisted descriptors and snapshots.
//!
//! Model types serialize directly to their descriptor form (camelCase JSON,
//! entities tagged by `__type`, constraints tagged by `kind`). Descriptors
//! written by older tooling may store booleans as `0`/`1`, which is accepted
//! on the way in.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::item::Named;
use crate::model::{Column, Constraint, Entity, Index, Table};

/// Persisted form of an [`Entity`].
pub type EntityDescriptor = Entity;
/// Persisted form of a [`Table`].
pub type TableDescriptor = Table;
/// Persisted form of a [`Column`].
pub type ColumnDescriptor = Column;
/// Persisted form of a [`Constraint`].
pub type ConstraintDescriptor = Constraint;
/// Persisted form of an [`Index`].
pub type IndexDescriptor = Index;

/// A stored version of the schema.
///
/// Version 0 with empty lists means nothing has been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonic version number.
    #[serde(default)]
    pub version: i64,
    /// Entity descriptors.
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
    /// Seed record statements already executed.
    #[serde(default)]
    pub records: Vec<String>,
}

impl Snapshot {
    /// Returns the empty version-0 snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a snapshot.
    #[must_use]
    pub const fn new(version: i64, entities: Vec<Entity>, records: Vec<String>) -> Self {
        Self {
            version,
            entities,
            records,
        }
    }

    /// Returns `true` if no version was stored yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.version == 0
    }

    /// Looks up an entity descriptor by name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }
}

/// Serializes entity descriptors to the JSON array stored by metadata tables.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn entities_to_json(entities: &[Entity]) -> Result<String> {
    Ok(serde_json::to_string(entities)?)
}

/// Parses a JSON array of entity descriptors.
///
/// # Errors
///
/// Returns an error if the text is not a valid descriptor array.
pub fn entities_from_json(text: &str) -> Result<Vec<Entity>> {
    Ok(serde_json::from_str(text)?)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Accepts `true`/`false`, integers and `"true"`/`"1"` strings; null is false.
pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseBool>::deserialize(deserializer)? {
        None => false,
        Some(LooseBool::Bool(value)) => value,
        Some(LooseBool::Int(value)) => value != 0,
        Some(LooseBool::Text(value)) => value == "1" || value.eq_ignore_ascii_case("true"),
    })
}
