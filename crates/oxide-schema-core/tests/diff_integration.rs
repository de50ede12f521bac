//! Integration tests for planning against stored snapshots.
//!
//! Each test defines a schema, plans it against a snapshot and checks the
//! statements for both dialects.

mod common;

use std::sync::Arc;

use oxide_schema_core::prelude::*;

fn define<F>(dialect: Arc<dyn Dialect>, schema: F) -> Database
where
    F: FnOnce(&mut Database) -> Result<()>,
{
    Database::define(dialect, schema).expect("schema should be valid")
}

// =============================================================================
// Fresh database
// =============================================================================

#[test]
fn user_table_is_created_on_empty_snapshot() {
    let db = define(Database::sqlite_dialect(), |db| {
        db.table("user")
            .col("id")
            .serial()
            .col("name")
            .varchar(64)
            .key(["id"]);
        Ok(())
    });

    let plan = db.plan(&Snapshot::empty(), false);
    assert_eq!(plan.version, 0);
    assert_eq!(
        plan.statements,
        vec![
            r#"CREATE TABLE "user"("id" INTEGER NOT NULL, "name" TEXT NOT NULL, CONSTRAINT "PK_user" PRIMARY KEY("id"))"#
        ]
    );
    assert!(plan.warnings.is_empty());
}

#[test]
fn library_schema_creates_in_declaration_order() {
    let db = define(Database::postgres_dialect(), common::library);
    let plan = db.plan(&Snapshot::empty(), false);

    assert_eq!(plan.statements.len(), 6);
    assert!(plan.statements[0].starts_with(r#"CREATE TABLE "user"("id" SERIAL NOT NULL"#));
    assert!(plan.statements[0].contains(r#""is_admin" BOOLEAN NOT NULL DEFAULT FALSE"#));
    assert!(plan.statements[1].contains(
        r#"CONSTRAINT "FK_user_profile_user_user_id" FOREIGN KEY("user_id") REFERENCES "user"("id")"#
    ));
    assert!(plan.statements[1].contains(r#""user_id" INT NOT NULL"#));
    assert!(plan.statements[3]
        .contains(r#"CONSTRAINT "PK_book_author" PRIMARY KEY("book_id", "author_id")"#));
    assert_eq!(
        plan.statements[4],
        r#"CREATE INDEX "idx_book_title" ON "book"("title")"#
    );
    assert!(plan.statements[5].starts_with(r#"INSERT INTO "user"("is_admin","name") VALUES"#));
    assert_eq!(plan.records, vec![plan.statements[5].clone()]);
}

// =============================================================================
// Evolving schemas
// =============================================================================

#[test]
fn unchanged_schema_plans_nothing() {
    for dialect in [Database::sqlite_dialect(), Database::postgres_dialect()] {
        let db = define(dialect, common::library);
        let prior = common::snapshot_of(&db, 3);

        let plan = db.plan(&prior, true);
        assert!(plan.is_empty(), "{}: {:?}", db.dialect().name(), plan.statements);
        assert_eq!(plan.version, 3);
    }
}

#[test]
fn adding_a_column_alters_the_table() {
    let v1 = define(Database::sqlite_dialect(), |db| {
        db.table("user")
            .col("id")
            .serial()
            .col("name")
            .varchar(64)
            .key(["id"]);
        Ok(())
    });
    let v2 = define(Database::sqlite_dialect(), |db| {
        db.table("user")
            .col("id")
            .serial()
            .col("name")
            .varchar(64)
            .col("email")
            .varchar(64)
            .key(["id"]);
        Ok(())
    });

    let plan = v2.plan(&common::snapshot_of(&v1, 1), false);
    assert_eq!(
        plan.statements,
        vec![r#"ALTER TABLE "user" ADD "email" TEXT NOT NULL"#]
    );
}

#[test]
fn postgres_alters_columns_in_one_statement() {
    let v1 = define(Database::postgres_dialect(), |db| {
        db.table("user")
            .col("id")
            .serial()
            .col("name")
            .varchar(32)
            .col("age")
            .small_int()
            .key(["id"]);
        Ok(())
    });
    let v2 = define(Database::postgres_dialect(), |db| {
        db.table("user")
            .col("id")
            .serial()
            .col("name")
            .varchar(64)
            .null()
            .col("age")
            .int()
            .default("18")
            .key(["id"]);
        Ok(())
    });

    let plan = v2.plan(&common::snapshot_of(&v1, 1), false);
    assert_eq!(
        plan.statements,
        vec![concat!(
            r#"ALTER TABLE "user" ALTER COLUMN "name" TYPE VARCHAR(64), "#,
            r#"ALTER COLUMN "name" DROP NOT NULL, "#,
            r#"ALTER COLUMN "age" TYPE INT, "#,
            r#"ALTER COLUMN "age" SET DEFAULT 18"#
        )]
    );
    assert!(plan.warnings.is_empty());
}

#[test]
fn sqlite_reports_what_it_cannot_alter() {
    let v1 = define(Database::sqlite_dialect(), |db| {
        db.table("user").col("id").serial().col("age").int().key(["id"]);
        Ok(())
    });
    let v2 = define(Database::sqlite_dialect(), |db| {
        db.table("user")
            .col("id")
            .serial()
            .col("age")
            .text()
            .col("nick")
            .text()
            .null()
            .unique()
            .key(["id"]);
        Ok(())
    });

    let plan = v2.plan(&common::snapshot_of(&v1, 1), false);
    // The column is added, its unique constraint and the type change are not.
    assert_eq!(
        plan.statements,
        vec![r#"ALTER TABLE "user" ADD "nick" TEXT NULL"#]
    );
    assert_eq!(plan.warnings.len(), 2);
    assert!(plan
        .warnings
        .iter()
        .any(|w| matches!(w, CapabilityWarning::ColumnType { column, .. } if column == "age")));
    assert!(plan.warnings.iter().any(|w| matches!(
        w,
        CapabilityWarning::Constraint { action: "add", .. }
    )));
}

#[test]
fn removed_entities_are_dropped_only_in_development() {
    let full = define(Database::sqlite_dialect(), common::library);
    let empty = define(Database::sqlite_dialect(), |_| Ok(()));
    let prior = common::snapshot_of(&full, 1);

    let production = empty.plan(&prior, false);
    assert!(production.statements.is_empty());
    assert_eq!(production.skipped_drops.len(), 5);

    let development = empty.plan(&prior, true);
    assert_eq!(development.statements[0], r#"DROP INDEX "idx_book_title""#);
    assert_eq!(development.statements[1], r#"DROP TABLE "book_author""#);
    assert_eq!(development.statements.len(), 5);
}

#[test]
fn snapshot_survives_json_round_trip() {
    let db = define(Database::postgres_dialect(), common::library);
    let snapshot = common::snapshot_of(&db, 2);

    let text = serde_json::to_string(&snapshot).unwrap();
    let restored: Snapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, snapshot);
    assert!(db.plan(&restored, true).is_empty());
}
