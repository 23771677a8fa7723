//! SQLite connection pool and migration tooling for Shelf.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;

pub mod migrate;

pub use migrate::Migration;

/// Connection parameters for [`Database::connect`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    /// Whether the URL points at a private in-memory database.
    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Shared handle to the connection pool.
///
/// Cloning is cheap; every clone refers to the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for the configured URL, creating the database file if needed.
    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| "invalid database url")?
            .create_if_missing(true);

        // Each in-memory connection is its own database, so the pool must
        // hold exactly one connection for its whole lifetime.
        let pool_options = if config.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .with_context(|| "failed to open database pool")?;

        tracing::info!(
            target: "shelf-db",
            max_connections = pool.options().get_max_connections(),
            "database pool ready"
        );

        Ok(Self { pool })
    }

    /// Check out one connection for the duration of a single operation.
    ///
    /// The connection returns to the pool when the guard is dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections to return and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(target: "shelf-db", "database pool closed");
    }
}
