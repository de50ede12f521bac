//! `sqlx` SQLite driver.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as _, ConnectOptions, Row as _, TypeInfo as _, ValueRef as _};
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::{Driver, Row};
use crate::error::Result;

/// Driver over a single SQLite connection.
///
/// All statements go through the same connection, so `BEGIN` and `COMMIT`
/// issued through [`Driver::run`] bracket everything in between.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl SqliteDriver {
    /// Connects to a database URL such as `sqlite:db.sqlite3`, creating the
    /// file if missing.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Database`](crate::MigrateError::Database) for
    /// a malformed URL or a failed connection.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let conn = options.connect().await?;
        debug!(url, "Connected to SQLite");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns the connection error.
    pub async fn memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn run(&self, sql: &str) -> Result<Vec<Row>> {
        let mut conn = self.conn.lock().await;
        let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
        rows.iter().map(row_to_json).collect()
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Row> {
    let mut map = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => Number::from_f64(row.try_get_unchecked::<f64, _>(i)?)
                    .map_or(Value::Null, Value::Number),
                "BLOB" => Value::from(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                _ => Value::String(row.try_get_unchecked::<String, _>(i)?),
            }
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_as_json() {
        let driver = SqliteDriver::memory().await.unwrap();
        let rows = driver
            .run("SELECT 1 AS n, 2.5 AS r, 'x' AS s, NULL AS z")
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], 1);
        assert_eq!(rows[0]["r"], 2.5);
        assert_eq!(rows[0]["s"], "x");
        assert_eq!(rows[0]["z"], Value::Null);
    }

    #[tokio::test]
    async fn test_transaction_hooks_share_connection() {
        let driver = SqliteDriver::memory().await.unwrap();
        driver.begin().await.unwrap();
        driver.run("CREATE TABLE t(a INTEGER)").await.unwrap();
        driver.rollback().await.unwrap();

        let rows = driver
            .run("SELECT name FROM sqlite_master WHERE name = 't'")
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_failed_statement_is_an_error() {
        let driver = SqliteDriver::memory().await.unwrap();
        assert!(driver.run("SELECT * FROM missing").await.is_err());
    }
}
