//! Migration executor.
//!
//! A migration runs inside one transaction:
//!
//! 1. `BEGIN` through the driver
//! 2. the pre-migration hook, if any
//! 3. the definition callback builds a fresh [`Database`]
//! 4. the store loads the prior snapshot and the database plans the delta
//! 5. statements execute in plan order, each awaited before the next
//! 6. if anything ran, the new snapshot is stored
//! 7. the post-migration hook, if any
//! 8. `COMMIT`
//!
//! Any failure rolls the transaction back and the error is returned
//! unchanged, so nothing is stored for a partial run.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use oxide_schema_core::{CapabilityWarning, Database, Dialect, Plan, SchemaError, Snapshot};
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::error::Result;
use crate::history::MetadataTable;
use crate::store::SchemaStore;

/// Options for a migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Emit drops for entities no longer declared.
    pub allow_drops: bool,
    /// Compute the plan, then roll back without executing it.
    pub dry_run: bool,
}

impl MigrateOptions {
    /// Enables drops, as in a development environment.
    #[must_use]
    pub const fn development(mut self, enabled: bool) -> Self {
        self.allow_drops = enabled;
        self
    }

    /// Enables dry-run mode (the plan is returned but not executed).
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

/// Outcome of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Snapshot version before the run.
    pub previous_version: i64,
    /// Snapshot version after the run; unchanged if nothing ran.
    pub version: i64,
    /// Statements executed, or planned for a dry run.
    pub statements: Vec<String>,
    /// Changes the dialect could not apply.
    pub warnings: Vec<CapabilityWarning>,
    /// Entities left in place because drops were not allowed.
    pub skipped_drops: Vec<String>,
}

impl MigrationReport {
    fn from_plan(plan: Plan, version: i64) -> Self {
        Self {
            previous_version: plan.version,
            version,
            statements: plan.statements,
            warnings: plan.warnings,
            skipped_drops: plan.skipped_drops,
        }
    }
}

/// Future returned by a migration hook.
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Async callback run inside the migration transaction.
///
/// ```rust,no_run
/// # use oxide_schema::prelude::*;
/// # async fn run(migrator: Migrator<SqliteDriver>) -> oxide_schema::Result<()> {
/// let migrator = migrator.with_post_migration(|driver| {
///     Box::pin(async move { driver.run("ANALYZE").await.map(drop) })
/// });
/// # Ok(())
/// # }
/// ```
pub type Hook = Box<dyn for<'a> Fn(&'a dyn Driver) -> HookFuture<'a> + Send + Sync>;

/// Brings a database to a declared schema.
pub struct Migrator<D: Driver> {
    driver: D,
    dialect: Arc<dyn Dialect>,
    store: Box<dyn SchemaStore>,
    options: MigrateOptions,
    pre_migration: Option<Hook>,
    post_migration: Option<Hook>,
}

impl<D: Driver> Migrator<D> {
    /// Creates a migrator storing snapshots in the `migration` table.
    pub fn new(driver: D, dialect: Arc<dyn Dialect>) -> Self {
        let store = Box::new(MetadataTable::new(Arc::clone(&dialect)));
        Self {
            driver,
            dialect,
            store,
            options: MigrateOptions::default(),
            pre_migration: None,
            post_migration: None,
        }
    }

    /// Uses another snapshot store.
    #[must_use]
    pub fn with_store(mut self, store: impl SchemaStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Runs `hook` after `BEGIN`, before the schema is defined.
    #[must_use]
    pub fn with_pre_migration<H>(mut self, hook: H) -> Self
    where
        H: for<'a> Fn(&'a dyn Driver) -> HookFuture<'a> + Send + Sync + 'static,
    {
        self.pre_migration = Some(Box::new(hook));
        self
    }

    /// Runs `hook` after the snapshot is stored, before `COMMIT`.
    #[must_use]
    pub fn with_post_migration<H>(mut self, hook: H) -> Self
    where
        H: for<'a> Fn(&'a dyn Driver) -> HookFuture<'a> + Send + Sync + 'static,
    {
        self.post_migration = Some(Box::new(hook));
        self
    }

    /// Sets the run options.
    #[must_use]
    pub fn options(mut self, options: MigrateOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Loads the current snapshot from the store.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn status(&self) -> Result<Snapshot> {
        self.store.load(&self.driver).await
    }

    /// Runs `define` against a fresh schema and applies the difference to
    /// the last stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns the definition error, a hook's error, the store error or the
    /// first failing statement's error. The transaction is rolled back in
    /// every case.
    pub async fn migrate<F>(&self, define: F) -> Result<MigrationReport>
    where
        F: FnOnce(&mut Database) -> std::result::Result<(), SchemaError>,
    {
        info!(
            dialect = self.dialect.name(),
            dry_run = self.options.dry_run,
            "Starting migration"
        );
        self.driver.begin().await?;

        match self.apply(define).await {
            Ok(report) if self.options.dry_run => {
                self.driver.rollback().await?;
                info!(
                    statements = report.statements.len(),
                    "Dry run complete, nothing applied"
                );
                Ok(report)
            }
            Ok(report) => {
                self.driver.commit().await?;
                info!(
                    version = report.version,
                    statements = report.statements.len(),
                    "Migration applied successfully"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, "Migration failed, rolling back");
                if let Err(rollback) = self.driver.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn apply<F>(&self, define: F) -> Result<MigrationReport>
    where
        F: FnOnce(&mut Database) -> std::result::Result<(), SchemaError>,
    {
        let driver: &dyn Driver = &self.driver;
        if let Some(hook) = &self.pre_migration {
            debug!("Running pre-migration hook");
            hook(driver).await?;
        }

        let db = Database::define(Arc::clone(&self.dialect), define)?;
        let prior = self.store.load(&self.driver).await?;
        let plan = db.plan(&prior, self.options.allow_drops);

        let version = if self.options.dry_run || plan.is_empty() {
            if plan.is_empty() {
                info!(version = prior.version, "Schema is up to date");
            }
            prior.version
        } else {
            for sql in &plan.statements {
                debug!(sql = %sql, "Executing SQL");
                self.driver.run(sql).await?;
            }
            self.store
                .store(&self.driver, &plan.entities, &plan.records)
                .await?
        };

        if let Some(hook) = &self.post_migration {
            debug!("Running post-migration hook");
            hook(driver).await?;
        }
        Ok(MigrationReport::from_plan(plan, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDriver;
    use oxide_schema_core::prelude::SqliteDialect;

    async fn migrator() -> Migrator<SqliteDriver> {
        let driver = SqliteDriver::memory().await.unwrap();
        Migrator::new(driver, Arc::new(SqliteDialect::new()))
    }

    fn users(db: &mut Database) -> std::result::Result<(), SchemaError> {
        db.table("user")
            .col("id")
            .serial()
            .col("name")
            .varchar(64)
            .null()
            .key(["id"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_migration() {
        let migrator = migrator().await;
        let report = migrator.migrate(users).await.unwrap();

        assert_eq!(report.previous_version, 0);
        assert_eq!(report.version, 1);
        assert_eq!(report.statements.len(), 1);

        // Verify table was created
        let rows = migrator
            .driver()
            .run("SELECT name FROM sqlite_master WHERE type='table' AND name='user'")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_idempotent() {
        let migrator = migrator().await;
        migrator.migrate(users).await.unwrap();

        let report = migrator.migrate(users).await.unwrap();
        assert!(report.statements.is_empty());
        assert_eq!(report.version, 1);
    }

    #[tokio::test]
    async fn test_dry_run() {
        let migrator = migrator()
            .await
            .options(MigrateOptions::default().dry_run(true));
        let report = migrator.migrate(users).await.unwrap();
        assert_eq!(report.statements.len(), 1);
        assert_eq!(report.version, 0);

        // Table should NOT exist (dry run)
        let rows = migrator
            .driver()
            .run("SELECT name FROM sqlite_master WHERE name='user'")
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_definition_error_rolls_back() {
        let migrator = migrator().await;
        let err = migrator
            .migrate(|db| {
                db.table("user").col("id").int().key(["missing"]);
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, crate::MigrateError::Schema(_)));
        assert_eq!(migrator.status().await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_hooks_run_inside_the_transaction() {
        let migrator = migrator()
            .await
            .with_pre_migration(|driver| {
                Box::pin(async move {
                    driver
                        .run("CREATE TABLE audit(step TEXT NOT NULL)")
                        .await
                        .map(drop)
                })
            })
            .with_post_migration(|driver| {
                Box::pin(async move {
                    driver
                        .run("INSERT INTO audit(step) SELECT name FROM sqlite_master WHERE name = 'user'")
                        .await
                        .map(drop)
                })
            });
        migrator.migrate(users).await.unwrap();

        // The post hook sees the tables created by the migration.
        let rows = migrator.driver().run("SELECT step FROM audit").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["step"], "user");
    }
}
