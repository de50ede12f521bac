//! Declarative, snapshot-based database migrations for Rust.
//!
//! `oxide-schema` applies schemas declared with `oxide-schema-core` to a
//! live database:
//! - The [`Migrator`](executor::Migrator) runs the definition, diffs it
//!   against the last stored snapshot and executes the delta in one
//!   transaction
//! - A [`Driver`](driver::Driver) executes SQL text; [`SqliteDriver`] and
//!   [`PostgresDriver`] each wrap a single `sqlx` connection
//! - A [`SchemaStore`](store::SchemaStore) persists snapshots in a metadata
//!   table, rebuilds them from the SQLite catalog, or keeps them in a JSON
//!   file
//!
//! # Example
//!
//! ```rust,no_run
//! use oxide_schema::prelude::*;
//!
//! # async fn run() -> oxide_schema::error::Result<()> {
//! let driver = SqliteDriver::connect("sqlite:app.db").await?;
//! let migrator = Migrator::new(driver, Database::sqlite_dialect())
//!     .with_store(NativeIntrospection::new());
//!
//! let report = migrator
//!     .migrate(|db| {
//!         db.table("user")
//!             .col("id").serial()
//!             .col("name").varchar(64).null()
//!             .key(["id"]);
//!         Ok(())
//!     })
//!     .await?;
//! println!("now at version {}", report.version);
//! # Ok(())
//! # }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply the demo schema, allowing drops
//! oxide-schema --database sqlite:db.sqlite3 migrate --development
//!
//! # Same schema on PostgreSQL
//! oxide-schema --database postgres://localhost/app migrate
//!
//! # Show the stored version
//! oxide-schema status
//!
//! # Print Postgres DDL against a JSON snapshot file
//! oxide-schema demo --dialect postgres --snapshot schema.json
//! ```

pub mod driver;
pub mod error;
pub mod executor;
pub mod history;
pub mod introspect;
pub mod postgres;
pub mod sqlite;
pub mod store;

pub use error::{MigrateError, Result};
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::driver::{Driver, EchoDriver, Row};
    pub use crate::error::MigrateError;
    pub use crate::executor::{Hook, HookFuture, MigrateOptions, MigrationReport, Migrator};
    pub use crate::history::MetadataTable;
    pub use crate::introspect::NativeIntrospection;
    pub use crate::postgres::PostgresDriver;
    pub use crate::sqlite::SqliteDriver;
    pub use crate::store::{JsonFileStore, SchemaStore};
    pub use oxide_schema_core::prelude::*;
}
