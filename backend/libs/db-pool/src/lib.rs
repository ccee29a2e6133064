//! PostgreSQL pool for the link store
//!
//! Every GraphQL request borrows connections from one shared pool: the feed
//! page and its count run back to back, then the `postedBy`/`votes` loaders
//! fan out in parallel. The defaults size the pool for that burst on a
//! single instance.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// Pool settings, read once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Label attached to pool log lines
    pub service_name: String,
    /// `postgres://` URL; never logged
    pub database_url: String,
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept warm between requests; clamped to `max_connections`
    pub min_connections: u32,
    /// Budget for the startup `SELECT 1`
    pub connect_timeout_secs: u64,
    /// How long a resolver waits for a free connection
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish_non_exhaustive()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: "link-service".to_string(),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl DbConfig {
    /// Read `DATABASE_URL` and the optional `DB_*` knobs
    ///
    /// Unset or unparsable knobs keep their `Default` value. Fails only
    /// when `DATABASE_URL` is missing.
    pub fn from_env(service_name: &str) -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable not set".to_string())?;

        let defaults = Self::default();
        let max_connections = env_or("DB_MAX_CONNECTIONS", defaults.max_connections).max(1);

        Ok(Self {
            service_name: service_name.to_string(),
            database_url,
            max_connections,
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections)
                .min(max_connections),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        })
    }

    pub fn log_config(&self) {
        info!(
            service = %self.service_name,
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            acquire_timeout_secs = self.acquire_timeout_secs,
            "Database pool configuration"
        );
    }

    /// Pool options without the URL; connections are checked on checkout
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .test_before_acquire(true)
    }
}

/// Connect and run `SELECT 1` so a bad URL fails at startup, not on the
/// first request
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(service = %config.service_name, "Connecting to PostgreSQL");

    let pool = config.pool_options().connect(&config.database_url).await?;

    let budget = Duration::from_secs(config.connect_timeout_secs);
    let verified = tokio::time::timeout(budget, sqlx::query("SELECT 1").execute(&pool))
        .await
        .unwrap_or_else(|_| {
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "database did not answer SELECT 1 in time",
            )))
        });

    if let Err(e) = verified {
        error!(service = %config.service_name, error = %e, "Database verification failed");
        return Err(e);
    }

    info!(service = %config.service_name, "Database pool ready");
    Ok(pool)
}
