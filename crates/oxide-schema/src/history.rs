//! Snapshot history table.
//!
//! Every successful migration appends one row to the metadata table
//! (`migration` by default):
//!
//! | column | contents |
//! |---|---|
//! | `id` | monotonic primary key, the snapshot version |
//! | `timestamp` | seconds since the epoch |
//! | `entities` | JSON array of entity descriptors |
//! | `records` | JSON array of executed seed statements |
//!
//! The row with the highest id is the current snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use oxide_schema_core::descriptor::{entities_from_json, entities_to_json};
use oxide_schema_core::model::Entity;
use oxide_schema_core::{Dialect, Snapshot};
use serde_json::Value;
use tracing::{debug, info};

use crate::driver::{Driver, Row};
use crate::error::{MigrateError, Result};
use crate::store::SchemaStore;

/// Default metadata table name.
pub const DEFAULT_METADATA_TABLE: &str = "migration";

/// Stores snapshots in an append-only table of the target database.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    table: String,
    dialect: Arc<dyn Dialect>,
}

impl MetadataTable {
    /// Creates a store using the default `migration` table.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            table: DEFAULT_METADATA_TABLE.to_string(),
            dialect,
        }
    }

    /// Uses another table name.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Ensures the metadata table exists.
    ///
    /// # Errors
    ///
    /// Returns the driver's error for the `CREATE TABLE` statement.
    pub async fn ensure_table(&self, driver: &dyn Driver) -> Result<()> {
        driver
            .run(&self.dialect.metadata_table_sql(&self.table))
            .await?;
        Ok(())
    }

    /// Returns the current version, 0 if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn version(&self, driver: &dyn Driver) -> Result<i64> {
        self.ensure_table(driver).await?;
        let rows = driver
            .run(&format!(
                "SELECT MAX(id) AS version FROM {}",
                self.dialect.quote(&self.table)
            ))
            .await?;
        Ok(rows.first().and_then(|r| integer(r, "version")).unwrap_or(0))
    }
}

#[async_trait]
impl SchemaStore for MetadataTable {
    async fn load(&self, driver: &dyn Driver) -> Result<Snapshot> {
        let version = self.version(driver).await?;
        if version == 0 {
            debug!(table = %self.table, "No stored snapshot");
            return Ok(Snapshot::empty());
        }

        let rows = driver
            .run(&format!(
                "SELECT entities, records FROM {} WHERE id = {version}",
                self.dialect.quote(&self.table)
            ))
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| MigrateError::InvalidState(format!("snapshot {version} not found")))?;

        let entities = match text(row, "entities") {
            Some(json) => entities_from_json(json)?,
            None => Vec::new(),
        };
        let records = match text(row, "records") {
            Some(json) => serde_json::from_str(json)?,
            None => Vec::new(),
        };
        debug!(version, entities = entities.len(), "Loaded snapshot");
        Ok(Snapshot::new(version, entities, records))
    }

    async fn store(
        &self,
        driver: &dyn Driver,
        entities: &[Entity],
        records: &[String],
    ) -> Result<i64> {
        self.ensure_table(driver).await?;
        let sql = format!(
            "INSERT INTO {}(timestamp, entities, records) VALUES({}, {}, {}) RETURNING id",
            self.dialect.quote(&self.table),
            chrono::Utc::now().timestamp(),
            literal(&entities_to_json(entities)?),
            literal(&serde_json::to_string(records)?),
        );
        let rows = driver.run(&sql).await?;
        let version = rows
            .first()
            .and_then(|r| integer(r, "id"))
            .ok_or_else(|| MigrateError::InvalidState("insert returned no id".to_string()))?;
        info!(table = %self.table, version, "Snapshot stored");
        Ok(version)
    }
}

fn literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn integer(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}

fn text<'r>(row: &'r Row, column: &str) -> Option<&'r str> {
    row.get(column).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDriver;
    use oxide_schema_core::model::{Column, Table};
    use oxide_schema_core::prelude::SqliteDialect;

    fn store() -> MetadataTable {
        MetadataTable::new(Arc::new(SqliteDialect::new()))
    }

    #[tokio::test]
    async fn test_ensure_table() {
        let driver = SqliteDriver::memory().await.unwrap();
        let history = store();

        // Should be idempotent
        history.ensure_table(&driver).await.unwrap();
        history.ensure_table(&driver).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_store_is_version_zero() {
        let driver = SqliteDriver::memory().await.unwrap();
        let snapshot = store().load(&driver).await.unwrap();
        assert_eq!(snapshot, Snapshot::empty());
    }

    #[tokio::test]
    async fn test_store_appends_versions() {
        let driver = SqliteDriver::memory().await.unwrap();
        let history = store();
        let entities = vec![Entity::from(
            Table::new("note").with_column(Column::new("body", "TEXT")),
        )];
        let records = vec!["INSERT INTO \"note\"(\"body\") VALUES('it''s')".to_string()];

        assert_eq!(history.store(&driver, &entities, &[]).await.unwrap(), 1);
        assert_eq!(history.store(&driver, &entities, &records).await.unwrap(), 2);

        let snapshot = history.load(&driver).await.unwrap();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.entities, entities);
        assert_eq!(snapshot.records, records);
    }

    #[tokio::test]
    async fn test_custom_table_name() {
        let driver = SqliteDriver::memory().await.unwrap();
        let history = store().with_table("schema_log");
        history.store(&driver, &[], &[]).await.unwrap();

        let rows = driver
            .run("SELECT COUNT(*) AS n FROM \"schema_log\"")
            .await
            .unwrap();
        assert_eq!(rows[0]["n"], 1);
    }

    #[test]
    fn test_literal_doubles_quotes() {
        assert_eq!(literal("a'b"), "'a''b'");
    }
}
