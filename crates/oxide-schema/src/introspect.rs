//! SQLite native introspection.
//!
//! Entity descriptors are rebuilt from the `CREATE` text SQLite keeps in
//! `sqlite_master`, so the diff baseline is the live schema rather than
//! what was last written to the metadata table. Version numbers and
//! applied seed statements still come from the metadata table.

use std::sync::Arc;

use async_trait::async_trait;
use oxide_schema_core::catalog::{parse_create_index, parse_create_table};
use oxide_schema_core::dialect::SqliteDialect;
use oxide_schema_core::model::Entity;
use oxide_schema_core::Snapshot;
use serde_json::Value;
use tracing::debug;

use crate::driver::Driver;
use crate::error::{MigrateError, Result};
use crate::history::MetadataTable;
use crate::store::SchemaStore;

const CATALOG_QUERY: &str =
    "SELECT type, name, sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY rowid";

/// Store reading entities from the SQLite catalog.
#[derive(Debug, Clone)]
pub struct NativeIntrospection {
    metadata: MetadataTable,
}

impl NativeIntrospection {
    /// Creates an introspecting store over the default metadata table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_metadata(MetadataTable::new(Arc::new(SqliteDialect::new())))
    }

    /// Uses `metadata` for versions and records.
    #[must_use]
    pub const fn with_metadata(metadata: MetadataTable) -> Self {
        Self { metadata }
    }

    /// Reads every user table and explicitly created index.
    ///
    /// The metadata table and SQLite's internal tables are skipped.
    ///
    /// # Errors
    ///
    /// Returns the driver's error, or
    /// [`MigrateError::Introspection`](crate::MigrateError::Introspection)
    /// naming the first statement that does not parse.
    pub async fn entities(&self, driver: &dyn Driver) -> Result<Vec<Entity>> {
        let rows = driver.run(CATALOG_QUERY).await?;
        let mut entities = Vec::new();
        for row in &rows {
            let field = |name: &str| row.get(name).and_then(Value::as_str).unwrap_or_default();
            let (kind, name, sql) = (field("type"), field("name"), field("sql"));
            if name == self.metadata.table() || name.starts_with("sqlite_") {
                continue;
            }

            let parsed = match kind {
                "table" => parse_create_table(sql).map(Entity::from),
                "index" => parse_create_index(sql).map(Entity::from),
                _ => {
                    debug!(kind, name, "Skipping catalog entry");
                    continue;
                }
            };
            let entity = parsed.map_err(|source| MigrateError::Introspection {
                table: name.to_string(),
                source,
            })?;
            entities.push(entity);
        }
        debug!(entities = entities.len(), "Introspected catalog");
        Ok(entities)
    }
}

impl Default for NativeIntrospection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaStore for NativeIntrospection {
    async fn load(&self, driver: &dyn Driver) -> Result<Snapshot> {
        let stored = self.metadata.load(driver).await?;
        let entities = self.entities(driver).await?;
        Ok(Snapshot::new(stored.version, entities, stored.records))
    }

    async fn store(
        &self,
        driver: &dyn Driver,
        entities: &[Entity],
        records: &[String],
    ) -> Result<i64> {
        self.metadata.store(driver, entities, records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDriver;
    use oxide_schema_core::item::Named;

    #[tokio::test]
    async fn test_reads_tables_and_indexes() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver
            .run("CREATE TABLE \"tag\"(\"id\" INTEGER NOT NULL, \"label\" TEXT NULL, CONSTRAINT \"PK_tag\" PRIMARY KEY(\"id\"))")
            .await
            .unwrap();
        driver
            .run("CREATE UNIQUE INDEX \"idx_tag_label\" ON \"tag\"(\"label\")")
            .await
            .unwrap();

        let store = NativeIntrospection::new();
        let snapshot = store.load(&driver).await.unwrap();

        assert_eq!(snapshot.version, 0);
        let names: Vec<&str> = snapshot.entities.iter().map(Named::name).collect();
        assert_eq!(names, vec!["tag", "idx_tag_label"]);
        let tag = snapshot.entities[0].as_table().unwrap();
        assert!(tag.column("id").unwrap().auto_increment());
        assert!(tag.column("label").unwrap().nullable());
    }

    #[tokio::test]
    async fn test_skips_internal_tables() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver
            .run("CREATE TABLE t(id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .await
            .unwrap();

        let store = NativeIntrospection::new();
        store.store(&driver, &[], &[]).await.unwrap();

        let names: Vec<String> = store
            .entities(&driver)
            .await
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["t"]);
    }

    #[tokio::test]
    async fn test_unparseable_definition() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver
            .run("CREATE TABLE t(a INTEGER, CONSTRAINT positive CHECK(a > 0))")
            .await
            .unwrap();

        let err = NativeIntrospection::new().entities(&driver).await.unwrap_err();
        assert!(matches!(err, MigrateError::Introspection { ref table, .. } if table == "t"));
    }
}
