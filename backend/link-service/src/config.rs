//! Configuration for the link service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use anyhow::{bail, Context, Result};
use crypto_core::PasswordHashConfig;
use db_pool::DbConfig;
use std::env;
use std::str::FromStr;

pub const SERVICE_NAME: &str = "link-service";

#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage backend selection
    pub store: StoreConfig,

    /// Token and password hashing configuration
    pub auth: AuthConfig,

    /// GraphQL configuration
    pub graphql: GraphQLConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND '{other}' (expected postgres or memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Only present for the postgres backend
    pub database: Option<DbConfig>,
    pub run_migrations: bool,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret used to sign and verify bearer tokens
    pub app_secret: String,
    /// Token lifetime; `None` issues tokens that never expire
    pub token_expiry_seconds: Option<u64>,
    pub password_hash: PasswordHashConfig,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("app_secret", &"[REDACTED]")
            .field("token_expiry_seconds", &self.token_expiry_seconds)
            .field("password_hash", &self.password_hash)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GraphQLConfig {
    /// Serve the GraphQL sandbox at /playground
    pub playground: bool,
    /// Enable introspection
    pub introspection: bool,
    /// Max query depth
    pub max_depth: usize,
    /// Max query complexity
    pub max_complexity: usize,
    /// Restrict updateLink/deleteLink to the link's poster
    pub enforce_link_ownership: bool,
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            playground: true,
            introspection: true,
            max_depth: 10,
            max_complexity: 1000,
            enforce_link_ownership: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// `APP_SECRET` is required. `DATABASE_URL` is required unless
    /// `STORE_BACKEND=memory`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("SERVER_PORT", 4000),
            },
            store: Self::store_from_env()?,
            auth: Self::auth_from_env()?,
            graphql: Self::graphql_from_env(),
            logging: LoggingConfig {
                format: match env::var("LOG_FORMAT").as_deref() {
                    Ok("pretty") => LogFormat::Pretty,
                    _ => LogFormat::Json,
                },
            },
        })
    }

    fn store_from_env() -> Result<StoreConfig> {
        let backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Postgres,
        };

        let database = match backend {
            StoreBackend::Postgres => Some(
                DbConfig::from_env(SERVICE_NAME)
                    .map_err(anyhow::Error::msg)
                    .context("DATABASE_URL must be set for the postgres store backend")?,
            ),
            StoreBackend::Memory => None,
        };

        Ok(StoreConfig {
            backend,
            database,
            run_migrations: env_or("DB_RUN_MIGRATIONS", true),
        })
    }

    fn auth_from_env() -> Result<AuthConfig> {
        let app_secret = env::var("APP_SECRET").context("APP_SECRET must be set")?;
        if app_secret.is_empty() {
            bail!("APP_SECRET must not be empty");
        }

        let token_expiry_seconds = match env::var("TOKEN_EXPIRY_SECONDS") {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .context("Invalid TOKEN_EXPIRY_SECONDS")?,
            )
            .filter(|secs| *secs > 0),
            Err(_) => None,
        };

        let defaults = PasswordHashConfig::default();

        Ok(AuthConfig {
            app_secret,
            token_expiry_seconds,
            password_hash: PasswordHashConfig {
                memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib),
                iterations: env_or("PASSWORD_HASH_ITERATIONS", defaults.iterations),
                parallelism: env_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism),
            },
        })
    }

    fn graphql_from_env() -> GraphQLConfig {
        let defaults = GraphQLConfig::default();

        GraphQLConfig {
            playground: env_or("GRAPHQL_PLAYGROUND", defaults.playground),
            introspection: env_or("GRAPHQL_INTROSPECTION", defaults.introspection),
            max_depth: env_or("GRAPHQL_MAX_DEPTH", defaults.max_depth),
            max_complexity: env_or("GRAPHQL_MAX_COMPLEXITY", defaults.max_complexity),
            enforce_link_ownership: env_or("LINK_OWNERSHIP_CHECK", defaults.enforce_link_ownership),
        }
    }
}
