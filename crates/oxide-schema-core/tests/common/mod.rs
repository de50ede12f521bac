#![allow(dead_code)]

use oxide_schema_core::prelude::*;
use serde_json::json;

/// Users, profiles, books and the book/author link table.
pub fn library(db: &mut Database) -> Result<()> {
    let user = db
        .table("user")
        .col("id")
        .serial()
        .col("name")
        .varchar(64)
        .unique()
        .col("is_admin")
        .boolean()
        .default("FALSE")
        .key(["id"])
        .insert(json!([
            {"name": "admin", "is_admin": true},
            {"name": "guest", "is_admin": false},
        ]))?
        .id();

    db.table("user_profile")
        .col("user_id")
        .references(user, "id")?
        .col("bio")
        .text()
        .null()
        .col("score")
        .double()
        .null()
        .key(["user_id"]);

    let book = db
        .table("book")
        .col("id")
        .serial()
        .col("title")
        .varchar(255)
        .col("published")
        .timestamp()
        .null()
        .key(["id"])
        .id();

    db.table("book_author")
        .col("book_id")
        .references(book, "id")?
        .col("author_id")
        .references(user, "id")?
        .key(["book_id", "author_id"]);

    db.index("idx_book_title").on_table(book, ["title"])?;
    Ok(())
}

/// Snapshot built from a schema, as a metadata store would persist it.
pub fn snapshot_of(db: &Database, version: i64) -> Snapshot {
    Snapshot::new(version, db.entities().to_vec(), db.record_statements())
}
