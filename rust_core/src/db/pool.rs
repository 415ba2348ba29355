//! Connection pool settings for the price history database

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database pool configuration
#[derive(Clone, Debug)]
pub struct DbPoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Maximum idle time before a connection is closed
    pub idle_timeout: Duration,
    /// Timeout for acquiring a connection
    pub acquire_timeout: Duration,
}

impl Default for DbPoolConfig {
    fn default() -> Self {
        // One writer (the aggregator) plus HTTP history reads
        Self {
            max_connections: 10,
            min_connections: 1,
            max_lifetime: Duration::from_secs(1800),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl DbPoolConfig {
    /// Load configuration from DB_POOL_* environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_connections: env_or("DB_POOL_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("DB_POOL_MIN_CONNECTIONS", defaults.min_connections),
            max_lifetime: Duration::from_secs(env_or(
                "DB_POOL_MAX_LIFETIME_SECS",
                defaults.max_lifetime.as_secs(),
            )),
            idle_timeout: Duration::from_secs(env_or(
                "DB_POOL_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout.as_secs(),
            )),
            acquire_timeout: Duration::from_secs(env_or(
                "DB_POOL_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Create a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, config: DbPoolConfig) -> Result<PgPool> {
    info!(
        "Creating database pool: max={}, min={}, acquire_timeout={:?}",
        config.max_connections, config.min_connections, config.acquire_timeout
    );

    let connect_opts =
        PgConnectOptions::from_str(database_url).context("Failed to parse database URL")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(connect_opts)
        .await
        .context("Failed to create database pool")?;

    info!("Database pool created successfully");
    Ok(pool)
}
