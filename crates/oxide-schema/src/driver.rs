//! Driver contract.
//!
//! A driver executes SQL text and returns rows as JSON objects. Transaction
//! hooks default to literal `BEGIN`/`COMMIT`/`ROLLBACK` statements issued
//! through [`Driver::run`].

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// A result row keyed by column name.
pub type Row = Map<String, Value>;

/// Executes statements against a target database.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Runs one statement and returns its rows.
    async fn run(&self, sql: &str) -> Result<Vec<Row>>;

    /// Opens a transaction.
    async fn begin(&self) -> Result<()> {
        self.run("BEGIN").await.map(drop)
    }

    /// Commits the open transaction.
    async fn commit(&self) -> Result<()> {
        self.run("COMMIT").await.map(drop)
    }

    /// Rolls back the open transaction.
    async fn rollback(&self) -> Result<()> {
        self.run("ROLLBACK").await.map(drop)
    }
}

/// Prints every statement to stdout and returns no rows.
///
/// Pair it with a file-backed store to preview migrations without a
/// database.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDriver;

#[async_trait]
impl Driver for EchoDriver {
    async fn run(&self, sql: &str) -> Result<Vec<Row>> {
        println!("{sql};");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_driver_returns_no_rows() {
        let driver = EchoDriver;
        assert!(driver.run("SELECT 1").await.unwrap().is_empty());
        driver.begin().await.unwrap();
        driver.commit().await.unwrap();
    }
}
