#![allow(dead_code)]

use oxide_schema::prelude::*;
use serde_json::json;

pub type DefineResult = std::result::Result<(), SchemaError>;

pub async fn memory_migrator() -> Migrator<SqliteDriver> {
    let driver = SqliteDriver::memory()
        .await
        .expect("Failed to open in-memory SQLite");
    Migrator::new(driver, Database::sqlite_dialect())
}

/// `user` with a serial key and a nullable name.
pub fn users(db: &mut Database) -> DefineResult {
    db.table("user")
        .col("id")
        .serial()
        .col("name")
        .varchar(64)
        .null()
        .key(["id"]);
    Ok(())
}

/// `users` plus a nullable `email`.
pub fn users_with_email(db: &mut Database) -> DefineResult {
    db.table("user")
        .col("id")
        .serial()
        .col("name")
        .varchar(64)
        .null()
        .col("email")
        .varchar(255)
        .null()
        .key(["id"]);
    Ok(())
}

/// The seeded `user` table of [`library`].
fn seeded_user(db: &mut Database) -> std::result::Result<TableId, SchemaError> {
    Ok(db
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
        .id())
}

/// [`library`] without the book tables.
pub fn library_users(db: &mut Database) -> DefineResult {
    seeded_user(db)?;
    Ok(())
}

/// Users with seed rows, books, the link table and a title index.
pub fn library(db: &mut Database) -> DefineResult {
    let user = seeded_user(db)?;

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

/// Names of user tables and indexes in the SQLite catalog.
pub async fn catalog(driver: &SqliteDriver) -> Vec<String> {
    driver
        .run("SELECT name FROM sqlite_master WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .await
        .expect("Failed to read catalog")
        .iter()
        .filter_map(|row| row["name"].as_str().map(str::to_string))
        .collect()
}
