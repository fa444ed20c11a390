//! Database module for Folo-Lite.
//!
//! Connection pooling and migration management on top of `sqlx`. The backend
//! is chosen at compile time with the `sqlite` (default) or `postgres`
//! feature; the rest of the crate only sees [`Db`] and [`DbPool`].

mod schema;

pub use schema::MIGRATIONS;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::Result;

#[cfg(all(feature = "sqlite", feature = "postgres"))]
compile_error!("features `sqlite` and `postgres` are mutually exclusive");

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable exactly one of the `sqlite` or `postgres` features");

/// Database driver in use.
#[cfg(feature = "sqlite")]
pub type Db = sqlx::Sqlite;
/// Database driver in use.
#[cfg(feature = "postgres")]
pub type Db = sqlx::Postgres;

/// Connection pool type.
#[cfg(feature = "sqlite")]
pub type DbPool = sqlx::SqlitePool;
/// Connection pool type.
#[cfg(feature = "postgres")]
pub type DbPool = sqlx::PgPool;

/// Database handle owning the connection pool.
///
/// Built once at process start and shared (usually behind an `Arc`) by the
/// web server and the sweep worker.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Connect using the given configuration and apply pending migrations.
    #[cfg(feature = "sqlite")]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
        use std::str::FromStr;
        use std::time::Duration;

        info!(url = %config.url, "Opening database");

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect using the given configuration and apply pending migrations.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        use sqlx::postgres::PgPoolOptions;

        info!("Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open a migrated in-memory database for testing.
    ///
    /// The pool is pinned to a single connection that never expires, since
    /// every SQLite in-memory connection is its own database.
    #[cfg(feature = "sqlite")]
    pub async fn open_in_memory() -> Result<Self> {
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        debug!("Opening in-memory database");

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the current schema version (0 before any migration).
    pub async fn schema_version(&self) -> Result<i64> {
        if !self.table_exists("schema_version").await? {
            return Ok(0);
        }

        let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;

        Ok(version)
    }

    /// Apply pending migrations, each in its own transaction.
    pub async fn migrate(&self) -> Result<()> {
        let current_version = self.schema_version().await?;

        if current_version as usize >= MIGRATIONS.len() {
            debug!(version = current_version, "Database is up to date");
            return Ok(());
        }

        info!(
            from = current_version,
            to = MIGRATIONS.len(),
            "Migrating database"
        );

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version    BIGINT PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        for (i, migration) in MIGRATIONS
            .iter()
            .enumerate()
            .skip(current_version as usize)
        {
            let version = (i + 1) as i64;
            debug!(version, "Applying migration");

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES ($1, $2)")
                .bind(version)
                .bind(format_datetime(&Utc::now()))
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        info!(version = MIGRATIONS.len(), "Database migration complete");
        Ok(())
    }

    /// Check if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        #[cfg(feature = "sqlite")]
        let sql = "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = $1)";
        #[cfg(feature = "postgres")]
        let sql = "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_name = $1)";

        let exists: bool = sqlx::query_scalar(sql)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

/// Format a timestamp the way every table stores it.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp (RFC 3339, or the SQLite `datetime()` format).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    None
}
