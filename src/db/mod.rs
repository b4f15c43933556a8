//! Database module for persistent storage.
//!
//! IQ modules only see the [`AccountStore`] trait. Two backends implement it:
//! - [`Database`]: async SQLite via SQLx, with embedded migrations
//! - [`MemoryStore`]: in-process map with failure injection, for tests and
//!   ephemeral deployments

mod accounts;
mod memory;

pub use accounts::AccountRepository;
pub use memory::MemoryStore;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("storage unavailable")]
    Unavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Account persistence as seen by IQ modules.
///
/// Every operation may fail transiently; callers surface the failure and do
/// not retry.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by name.
    async fn fetch_account(&self, username: &str) -> Result<Option<Account>, DbError>;

    /// Insert the account, or replace the password of an existing one.
    async fn upsert_account(&self, account: &Account) -> Result<(), DbError>;

    /// Delete an account. Deleting a missing account succeeds.
    async fn delete_account(&self, username: &str) -> Result<(), DbError>;
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (or create) the database at `path`, or a private in-memory one
    /// for `:memory:`, and apply pending migrations.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let (options, max_connections) = Self::connect_options(path);
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(Some(Self::IDLE_TIMEOUT))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        info!(path = %path, max_connections, "Database connected");
        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Connection options and pool size for `path`.
    fn connect_options(path: &str) -> (SqliteConnectOptions, u32) {
        if path == ":memory:" {
            // Every handle gets its own shared-cache name so the pool's
            // connections agree on one database and handles never collide.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let uri = format!(
                "file:stanzad-memdb-{}-{id}?mode=memory&cache=shared",
                std::process::id()
            );
            let options = SqliteConnectOptions::new()
                .filename(&uri)
                .shared_cache(true)
                .create_if_missing(true);
            return (options, 1);
        }

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        (options, 5)
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Account queries against this database.
    pub fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.pool)
    }
}

#[async_trait]
impl AccountStore for Database {
    async fn fetch_account(&self, username: &str) -> Result<Option<Account>, DbError> {
        self.accounts().find_by_name(username).await
    }

    async fn upsert_account(&self, account: &Account) -> Result<(), DbError> {
        self.accounts().upsert(account).await
    }

    async fn delete_account(&self, username: &str) -> Result<(), DbError> {
        self.accounts().delete(username).await
    }
}
