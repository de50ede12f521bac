//! Schema builder DSL and migration planning.
//!
//! A [`Database`] collects the desired schema for one migration run:
//!
//! ```
//! use oxide_schema_core::{Database, SchemaError};
//!
//! let db = Database::define(Database::sqlite_dialect(), |db| {
//!     let user = db
//!         .table("user")
//!         .col("id").serial()
//!         .col("name").varchar(64)
//!         .key(["id"])
//!         .id();
//!     let book = db
//!         .table("book")
//!         .col("id").serial()
//!         .col("author_id").references(user, "id")?
//!         .col("title").text()
//!         .key(["id"])
//!         .id();
//!     db.index("idx_book_title").on_table(book, ["title"])?;
//!     Ok(())
//! })?;
//! assert_eq!(db.entities().len(), 3);
//! # Ok::<(), SchemaError>(())
//! ```
//!
//! Builders borrow the database mutably and hand out [`TableId`] handles
//! for cross-table references.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::descriptor::Snapshot;
use crate::dialect::{CapabilityWarning, ColumnType, Dialect, PostgresDialect, SqliteDialect};
use crate::diff::partition;
use crate::error::{Result, SchemaError};
use crate::item::{AlterContext, Item, Named};
use crate::model::{Column, Constraint, Entity, Index, Table};
use crate::record::Insertion;

/// Handle to a table declared in a [`Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

/// The desired schema for one migration run.
#[derive(Debug, Clone)]
pub struct Database {
    dialect: Arc<dyn Dialect>,
    entities: Vec<Entity>,
    records: Vec<Insertion>,
}

impl Database {
    /// Creates an empty schema for `dialect`.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            entities: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Returns a shared SQLite dialect.
    #[must_use]
    pub fn sqlite_dialect() -> Arc<dyn Dialect> {
        Arc::new(SqliteDialect::new())
    }

    /// Returns a shared PostgreSQL dialect.
    #[must_use]
    pub fn postgres_dialect() -> Arc<dyn Dialect> {
        Arc::new(PostgresDialect::new())
    }

    /// Runs a definition callback against a fresh schema and validates it.
    ///
    /// For dialects where auto-increment is the rowid alias, the flag is
    /// then normalized to match what the catalog reports.
    ///
    /// # Errors
    ///
    /// Returns the callback's error, or a validation error.
    pub fn define<F>(dialect: Arc<dyn Dialect>, define: F) -> Result<Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut db = Self::new(dialect);
        define(&mut db)?;
        db.validate()?;
        if db.dialect.auto_increment_is_rowid() {
            for entity in &mut db.entities {
                if let Entity::Table(table) = entity {
                    table.normalize_rowid_alias();
                }
            }
        }
        Ok(db)
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Declares a table.
    pub fn table(&mut self, name: impl Into<String>) -> TableBuilder<'_> {
        let id = TableId(self.entities.len());
        self.entities.push(Entity::Table(Table::new(name)));
        TableBuilder { db: self, id }
    }

    /// Declares an index; attach it with [`IndexBuilder::on_table`].
    pub fn index(&mut self, name: impl Into<String>) -> IndexBuilder<'_> {
        let position = self.entities.len();
        self.entities.push(Entity::Index(Index::new(name)));
        IndexBuilder { db: self, position }
    }

    /// Returns the declared entities in declaration order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns the declared seed records.
    #[must_use]
    pub fn records(&self) -> &[Insertion] {
        &self.records
    }

    /// Returns the table behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was handed out by another [`Database`] and does not
    /// point at a table here. Use [`Database::try_get`] for foreign handles.
    #[must_use]
    pub fn get(&self, id: TableId) -> &Table {
        self.try_get(id)
            .unwrap_or_else(|| panic!("{id:?} does not point at a table of this database"))
    }

    /// Returns the table behind a handle, or `None` if the handle does not
    /// point at a table of this database.
    #[must_use]
    pub fn try_get(&self, id: TableId) -> Option<&Table> {
        self.entities.get(id.0).and_then(Entity::as_table)
    }

    /// Finds a declared table by name.
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<TableId> {
        self.entities
            .iter()
            .position(|e| matches!(e, Entity::Table(t) if t.name() == name))
            .map(TableId)
    }

    fn resolve(&self, id: TableId) -> Result<&Table> {
        self.try_get(id)
            .ok_or_else(|| SchemaError::ForeignTableHandle(format!("{id:?}")))
    }

    fn table_mut(&mut self, id: TableId) -> &mut Table {
        match &mut self.entities[id.0] {
            Entity::Table(table) => table,
            Entity::Index(_) => unreachable!("builder handle points at an index"),
        }
    }

    fn index_mut(&mut self, position: usize) -> &mut Index {
        match &mut self.entities[position] {
            Entity::Index(index) => index,
            Entity::Table(_) => unreachable!("index position points at a table"),
        }
    }

    /// Checks names and index attachments once the definition is complete.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate entity, duplicate column, unknown key
    /// column or incomplete index found.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for entity in &self.entities {
            if !names.insert(entity.name()) {
                return Err(SchemaError::DuplicateEntity(entity.name().to_string()));
            }
            match entity {
                Entity::Table(table) => validate_table(table)?,
                Entity::Index(index) => {
                    if index.table().is_empty() || index.columns().is_empty() {
                        return Err(SchemaError::IncompleteIndex(index.name().to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Renders every seed record as an INSERT statement.
    #[must_use]
    pub fn record_statements(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.to_sql(self.dialect()))
            .collect()
    }

    /// Computes the statements bringing `prior` to this schema.
    ///
    /// Order: creates, alters (a changed index is dropped and immediately
    /// re-created), drops, then seed records not yet in `prior.records`.
    /// Drops are only emitted when `allow_drops` is set.
    ///
    /// A name that changed kind (a table replaced by an index or the other
    /// way round) is a drop followed by a create. Without `allow_drops` both
    /// are skipped and the prior entity stays in [`Plan::entities`].
    #[must_use]
    pub fn plan(&self, prior: &Snapshot, allow_drops: bool) -> Plan {
        let dialect = self.dialect();
        let diff = partition(&self.entities, &prior.entities);
        let mut statements = Vec::new();
        let mut warnings = Vec::new();
        let mut skipped_drops = Vec::new();
        let mut entities = self.entities.clone();

        for entity in &diff.create {
            statements.push(entity.create_sql(dialect));
        }

        let mut ctx = AlterContext::new(dialect, "", &mut warnings);
        for &(entity, old) in &diff.alter {
            if !entity.same_kind(old) {
                if allow_drops {
                    statements.push(old.drop_sql(dialect));
                    statements.push(entity.create_sql(dialect));
                } else {
                    debug!(
                        entity = old.name(),
                        from = old.kind(),
                        to = entity.kind(),
                        "Kind change skipped outside development mode"
                    );
                    skipped_drops.push(old.name().to_string());
                    if let Some(slot) = entities.iter_mut().find(|e| e.name() == old.name()) {
                        slot.clone_from(old);
                    }
                }
                continue;
            }
            statements.extend(entity.alter_sql(old, &mut ctx));
            if let (Entity::Index(index), Entity::Index(_)) = (entity, old) {
                statements.push(index.create_sql(dialect));
            }
        }

        // Reverse prior order: indexes and referencing tables go first.
        for old in diff.drop.iter().rev() {
            if allow_drops {
                statements.push(old.drop_sql(dialect));
            } else {
                debug!(
                    entity = old.name(),
                    kind = old.kind(),
                    "Drop skipped outside development mode"
                );
                skipped_drops.push(old.name().to_string());
            }
        }

        let mut records = prior.records.clone();
        for sql in self.record_statements() {
            if !records.contains(&sql) {
                statements.push(sql.clone());
                records.push(sql);
            }
        }

        Plan {
            version: prior.version,
            statements,
            entities,
            records,
            warnings,
            skipped_drops,
        }
    }
}

fn validate_table(table: &Table) -> Result<()> {
    let mut columns = HashSet::new();
    for column in table.columns() {
        if !columns.insert(column.name()) {
            return Err(SchemaError::DuplicateColumn {
                table: table.name().to_string(),
                column: column.name().to_string(),
            });
        }
    }
    if let Some(key) = table.primary_key() {
        for column in key.columns() {
            if !columns.contains(column) {
                return Err(SchemaError::UnknownKeyColumn {
                    table: table.name().to_string(),
                    column: column.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Pending migration computed by [`Database::plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Version of the snapshot the plan was computed against.
    pub version: i64,
    /// Statements to execute, in order.
    pub statements: Vec<String>,
    /// Entities to persist once the statements ran.
    pub entities: Vec<Entity>,
    /// Seed record statements to persist: stored ones plus the new ones.
    pub records: Vec<String>,
    /// Changes the dialect could not apply.
    pub warnings: Vec<CapabilityWarning>,
    /// Entities that would have been dropped in development mode.
    pub skipped_drops: Vec<String>,
}

impl Plan {
    /// Returns `true` if there is nothing to execute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Fluent builder for a declared table.
pub struct TableBuilder<'a> {
    db: &'a mut Database,
    id: TableId,
}

// Chains end by discarding the builder.
#[allow(clippy::return_self_not_must_use, clippy::must_use_candidate)]
impl<'a> TableBuilder<'a> {
    /// Returns the table's handle.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.id
    }

    /// Adds a column, typed as text until a type method is called.
    pub fn col(self, name: impl Into<String>) -> ColumnBuilder<'a> {
        let data_type = self.db.dialect.type_name(ColumnType::Text);
        let table = self.db.table_mut(self.id);
        table.columns_mut().push(Column::new(name, data_type));
        let position = table.columns().len() - 1;
        ColumnBuilder {
            db: self.db,
            table: self.id,
            position,
        }
    }

    /// Declares the primary key `PK_<table>`.
    pub fn key<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = self.db.table_mut(self.id);
        let constraint = Constraint::primary_key(table.name(), columns);
        table.constraints_mut().push(constraint);
        self
    }

    /// Marks the table as a checkpoint.
    pub fn checkpoint(self) -> Self {
        self.db.table_mut(self.id).set_checkpoint(true);
        self
    }

    /// Records the table's previous name.
    pub fn rename_from(self, old: impl Into<String>) -> Self {
        self.db.table_mut(self.id).set_rename_from(old.into());
        self
    }

    /// Adds seed records (an object or an array of objects).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRecord`] for malformed records.
    pub fn insert(self, records: Value) -> Result<Self> {
        let name = self.db.get(self.id).name().to_string();
        let insertion = Insertion::from_value(name, records)?;
        self.db.records.push(insertion);
        Ok(self)
    }
}

/// Fluent builder for the last declared column of a table.
pub struct ColumnBuilder<'a> {
    db: &'a mut Database,
    table: TableId,
    position: usize,
}

#[allow(clippy::return_self_not_must_use, clippy::must_use_candidate)]
impl<'a> ColumnBuilder<'a> {
    fn column(&mut self) -> &mut Column {
        let position = self.position;
        &mut self.db.table_mut(self.table).columns_mut()[position]
    }

    fn typed(mut self, column_type: ColumnType) -> Self {
        let data_type = self.db.dialect.type_name(column_type);
        self.column().set_data_type(data_type);
        self
    }

    fn auto(mut self, column_type: ColumnType) -> Self {
        self = self.typed(column_type);
        self.column().set_auto_increment(true);
        self
    }

    /// Auto-incremented 32-bit integer.
    pub fn serial(self) -> Self {
        self.auto(ColumnType::Int)
    }

    /// Auto-incremented 64-bit integer.
    pub fn big_serial(self) -> Self {
        self.auto(ColumnType::BigInt)
    }

    /// 32-bit integer.
    pub fn int(self) -> Self {
        self.typed(ColumnType::Int)
    }

    /// 64-bit integer.
    pub fn big_int(self) -> Self {
        self.typed(ColumnType::BigInt)
    }

    /// 16-bit integer.
    pub fn small_int(self) -> Self {
        self.typed(ColumnType::SmallInt)
    }

    /// 8-bit integer.
    pub fn tiny_int(self) -> Self {
        self.typed(ColumnType::TinyInt)
    }

    /// Single precision float.
    pub fn float(self) -> Self {
        self.typed(ColumnType::Float)
    }

    /// Double precision float.
    pub fn double(self) -> Self {
        self.typed(ColumnType::Double)
    }

    /// Bounded string.
    pub fn varchar(self, len: u32) -> Self {
        self.typed(ColumnType::Varchar(len))
    }

    /// Unbounded string.
    pub fn text(self) -> Self {
        self.typed(ColumnType::Text)
    }

    /// JSON document.
    pub fn json(self) -> Self {
        self.typed(ColumnType::Json)
    }

    /// Boolean flag.
    pub fn boolean(self) -> Self {
        self.typed(ColumnType::Boolean)
    }

    /// Date and time.
    pub fn timestamp(self) -> Self {
        self.typed(ColumnType::Timestamp)
    }

    /// Raw dialect type, in the form [`Dialect::canonical_type`] stores.
    pub fn data_type(mut self, data_type: impl AsRef<str>) -> Self {
        let data_type = self.db.dialect.canonical_type(data_type.as_ref());
        self.column().set_data_type(data_type);
        self
    }

    /// Allows NULL.
    pub fn null(mut self) -> Self {
        self.column().set_nullable(true);
        self
    }

    /// Sets a raw SQL default (`"0"`, `"'draft'"`, `"CURRENT_TIMESTAMP"`).
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.column().set_default(value.into());
        self
    }

    /// Adds the unique key `UK_<table>_<column>`.
    pub fn unique(self) -> Self {
        let position = self.position;
        let table = self.db.table_mut(self.table);
        let column = table.columns()[position].name().to_string();
        let constraint = Constraint::unique_key(table.name(), column);
        table.constraints_mut().push(constraint);
        self
    }

    /// References `column` of `table`, inheriting its data type and adding
    /// the foreign key `FK_<table>_<ref_table>_<column>`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidReference`] if the referenced column
    /// does not exist, or [`SchemaError::ForeignTableHandle`] if `table`
    /// belongs to another schema.
    pub fn references(mut self, table: TableId, column: &str) -> Result<Self> {
        let target = self.db.resolve(table)?;
        let owner = self.db.get(self.table);
        let own_column = owner.columns()[self.position].name().to_string();
        let Some(referenced) = target.column(column) else {
            return Err(SchemaError::InvalidReference {
                table: target.name().to_string(),
                column: column.to_string(),
                from_table: owner.name().to_string(),
                from_column: own_column,
            });
        };
        let data_type = referenced.data_type().to_string();
        let ref_table = target.name().to_string();

        self.column().set_data_type(data_type);
        let owner = self.db.table_mut(self.table);
        let constraint = Constraint::foreign_key(owner.name(), own_column, ref_table, column);
        owner.constraints_mut().push(constraint);
        Ok(self)
    }

    /// Records the column's previous name.
    pub fn rename_from(mut self, old: impl Into<String>) -> Self {
        self.column().set_rename_from(old.into());
        self
    }

    /// Adds another column to the same table.
    pub fn col(self, name: impl Into<String>) -> ColumnBuilder<'a> {
        self.done().col(name)
    }

    /// Declares the table's primary key.
    pub fn key<I, S>(self, columns: I) -> TableBuilder<'a>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.done().key(columns)
    }

    /// Adds seed records to the table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRecord`] for malformed records.
    pub fn insert(self, records: Value) -> Result<TableBuilder<'a>> {
        self.done().insert(records)
    }

    /// Returns the owning table's handle.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.table
    }

    /// Returns to the table builder.
    #[must_use]
    pub fn done(self) -> TableBuilder<'a> {
        TableBuilder {
            db: self.db,
            id: self.table,
        }
    }
}

/// Fluent builder for a declared index.
pub struct IndexBuilder<'a> {
    db: &'a mut Database,
    position: usize,
}

#[allow(clippy::return_self_not_must_use, clippy::must_use_candidate)]
impl IndexBuilder<'_> {
    /// Attaches the index to `table` over `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownIndexColumn`] if a column does not
    /// exist on the table, [`SchemaError::IncompleteIndex`] if no column is
    /// given, or [`SchemaError::ForeignTableHandle`] if `table` belongs to
    /// another schema.
    pub fn on_table<I, S>(self, table: TableId, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let target = self.db.resolve(table)?;
        let name = self.db.entities[self.position].name().to_string();
        if columns.is_empty() {
            return Err(SchemaError::IncompleteIndex(name));
        }
        if let Some(missing) = columns.iter().find(|c| target.column(c).is_none()) {
            return Err(SchemaError::UnknownIndexColumn {
                index: name,
                table: target.name().to_string(),
                column: missing.clone(),
            });
        }
        let table_name = target.name().to_string();
        self.db.index_mut(self.position).attach(table_name, columns);
        Ok(self)
    }

    /// Makes the index unique.
    pub fn unique(self) -> Self {
        self.db.index_mut(self.position).set_unique(true);
        self
    }

    /// Marks the index as a checkpoint.
    pub fn checkpoint(self) -> Self {
        self.db.index_mut(self.position).set_checkpoint(true);
        self
    }

    /// Records the index's previous name.
    pub fn rename_from(self, old: impl Into<String>) -> Self {
        self.db.index_mut(self.position).set_rename_from(old.into());
        self
    }
}
