//! oxide-schema CLI
//!
//! Applies a demo library schema to a database, or previews it against a
//! JSON snapshot file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_schema::prelude::*;

/// Declarative, snapshot-based database migrations.
#[derive(Parser)]
#[command(name = "oxide-schema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (`sqlite:` path or `postgres://` connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the demo schema to the database.
    Migrate {
        /// Allow dropping tables and indexes that are no longer declared.
        #[arg(long)]
        development: bool,

        /// Deployment environment; `development` allows drops.
        #[arg(long, env = "OXIDE_SCHEMA_ENV", default_value = "production")]
        environment: String,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,

        /// Read the current schema from the SQLite catalog (SQLite only).
        #[arg(long)]
        introspect: bool,
    },

    /// Show the stored schema version.
    Status {
        /// Read the current schema from the SQLite catalog.
        #[arg(long)]
        introspect: bool,
    },

    /// Print the demo migration without a database.
    Demo {
        /// Target dialect (`postgres` or `sqlite`).
        #[arg(long, default_value = "postgres")]
        dialect: String,

        /// Snapshot file to diff against and update.
        #[arg(long, default_value = "schema.json")]
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Migrate {
            development,
            environment,
            dry_run,
            introspect,
        } => {
            let allow_drops = development || environment == "development";
            let options = MigrateOptions::default()
                .development(allow_drops)
                .dry_run(dry_run);

            let report = if is_postgres(&cli.database) {
                if introspect {
                    bail!("--introspect reads the SQLite catalog only");
                }
                let driver = PostgresDriver::connect(&cli.database)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                Migrator::new(driver, Database::postgres_dialect())
                    .options(options)
                    .migrate(library)
                    .await?
            } else {
                let driver = SqliteDriver::connect(&cli.database)
                    .await
                    .with_context(|| format!("Failed to open {}", cli.database))?;
                let mut migrator =
                    Migrator::new(driver, Database::sqlite_dialect()).options(options);
                if introspect {
                    migrator = migrator.with_store(NativeIntrospection::new());
                }
                migrator.migrate(library).await?
            };
            print_report(&report, dry_run);
        }

        Commands::Status { introspect } => {
            let snapshot = if is_postgres(&cli.database) {
                if introspect {
                    bail!("--introspect reads the SQLite catalog only");
                }
                let driver = PostgresDriver::connect(&cli.database).await?;
                Migrator::new(driver, Database::postgres_dialect())
                    .status()
                    .await?
            } else {
                let driver = SqliteDriver::connect(&cli.database).await?;
                let mut migrator = Migrator::new(driver, Database::sqlite_dialect());
                if introspect {
                    migrator = migrator.with_store(NativeIntrospection::new());
                }
                migrator.status().await?
            };
            print_snapshot(&snapshot);
        }

        Commands::Demo { dialect, snapshot } => {
            let dialect: Arc<dyn Dialect> =
                dialect_by_name(&dialect).ok_or_else(|| anyhow!("Unknown dialect '{dialect}'"))?;
            info!(path = %snapshot.display(), "Previewing migration");

            let migrator = Migrator::new(EchoDriver, dialect).with_store(JsonFileStore::new(snapshot));
            let report = migrator.migrate(library).await?;
            print_report(&report, false);
        }
    }

    Ok(())
}

fn is_postgres(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

fn print_snapshot(snapshot: &Snapshot) {
    if snapshot.is_empty() {
        info!("No schema has been applied yet.");
        return;
    }
    println!("\nSchema version {}:", snapshot.version);
    println!("{:-<60}", "");
    for entity in &snapshot.entities {
        println!(" [{}] {}", entity.kind(), entity.name());
    }
    println!(" {} seed statement(s) applied", snapshot.records.len());
    println!();
}

fn print_report(report: &MigrationReport, dry_run: bool) {
    if dry_run {
        for sql in &report.statements {
            println!("{sql};");
        }
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for name in &report.skipped_drops {
        println!("kept: {name} (drops need --development)");
    }
    info!(
        from = report.previous_version,
        to = report.version,
        statements = report.statements.len(),
        "Done"
    );
}

/// Users, books and their authors.
fn library(db: &mut Database) -> std::result::Result<(), SchemaError> {
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
        .insert(json!([{"name": "admin", "is_admin": true}]))?
        .id();

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
