//! Declarative schema model, diff engine and dialect-aware DDL generation.
//!
//! `oxide-schema-core` describes a desired database schema, compares it with
//! a persisted snapshot and produces the statements that bring the database
//! from one to the other:
//! - Tables, columns, constraints and indexes are declared through a
//!   fluent builder on [`Database`]
//! - The diff engine partitions items into create, alter and drop sets by
//!   name
//! - Each [`Dialect`] renders SQL and decides which alterations the backend
//!   can perform; the rest surface as [`CapabilityWarning`]s
//! - The catalog parser rebuilds descriptors from SQLite's stored DDL
//!
//! # Example
//!
//! ```rust
//! use oxide_schema_core::prelude::*;
//!
//! let db = Database::define(Database::postgres_dialect(), |db| {
//!     db.table("user")
//!         .col("id").serial()
//!         .col("name").varchar(64)
//!         .key(["id"]);
//!     Ok(())
//! })?;
//!
//! let plan = db.plan(&Snapshot::empty(), false);
//! assert_eq!(
//!     plan.statements,
//!     vec![r#"CREATE TABLE "user"("id" SERIAL NOT NULL, "name" VARCHAR(64) NOT NULL, CONSTRAINT "PK_user" PRIMARY KEY("id"))"#]
//! );
//! # Ok::<(), SchemaError>(())
//! ```
//!
//! This crate does no I/O. Executing plans and storing snapshots is the job
//! of the `oxide-schema` crate.

pub mod catalog;
pub mod database;
pub mod descriptor;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod item;
pub mod model;
pub mod record;

pub use catalog::ParseError;
pub use database::{ColumnBuilder, Database, IndexBuilder, Plan, TableBuilder, TableId};
pub use descriptor::Snapshot;
pub use dialect::{CapabilityWarning, Dialect};
pub use error::{Result, SchemaError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{parse_create_index, parse_create_table, ParseError};
    pub use crate::database::{Database, Plan, TableId};
    pub use crate::descriptor::{entities_from_json, entities_to_json, Snapshot};
    pub use crate::dialect::{
        dialect_by_name, AlterPolicy, CapabilityWarning, ColumnType, Dialect, PostgresDialect,
        SqliteDialect,
    };
    pub use crate::diff::{partition, Partition};
    pub use crate::error::{Result, SchemaError};
    pub use crate::item::{AlterContext, Diffable, Item, Named};
    pub use crate::model::{Column, Constraint, Entity, Index, Table};
    pub use crate::record::Insertion;
}
