//! Snapshot persistence.
//!
//! A [`SchemaStore`] loads the last applied [`Snapshot`] and appends a new
//! version after a successful migration. Stores that live in the target
//! database ([`MetadataTable`](crate::history::MetadataTable),
//! [`NativeIntrospection`](crate::introspect::NativeIntrospection)) run
//! their statements through the migration's driver, inside its
//! transaction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use oxide_schema_core::model::Entity;
use oxide_schema_core::Snapshot;
use tracing::{debug, info};

use crate::driver::Driver;
use crate::error::Result;

/// Versioned storage for applied schemas.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Loads the latest snapshot, or the empty version 0.
    async fn load(&self, driver: &dyn Driver) -> Result<Snapshot>;

    /// Appends a snapshot and returns its version.
    async fn store(&self, driver: &dyn Driver, entities: &[Entity], records: &[String])
        -> Result<i64>;
}

/// Snapshot kept in a JSON file next to the application.
///
/// Only the latest version is kept. The driver is not used.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Snapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot file yet");
                Ok(Snapshot::empty())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SchemaStore for JsonFileStore {
    async fn load(&self, _driver: &dyn Driver) -> Result<Snapshot> {
        self.read().await
    }

    async fn store(
        &self,
        _driver: &dyn Driver,
        entities: &[Entity],
        records: &[String],
    ) -> Result<i64> {
        let version = self.read().await?.version + 1;
        let snapshot = Snapshot::new(version, entities.to_vec(), records.to_vec());
        tokio::fs::write(&self.path, serde_json::to_string_pretty(&snapshot)?).await?;
        info!(path = %self.path.display(), version, "Snapshot written");
        Ok(version)
    }
}
