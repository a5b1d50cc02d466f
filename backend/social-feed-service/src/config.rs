/// Configuration management for Social Feed Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use s3_utils::S3Config;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Which store backs users, posts and notifications
    pub store: StoreBackend,
    /// Database configuration (postgres backend only)
    pub database: Option<DatabaseConfig>,
    /// Session verification
    pub auth: AuthConfig,
    /// Media storage; `None` disables image upload
    pub media: Option<S3Config>,
    /// Feed assembly settings
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the session issuer
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum users returned by the suggestion endpoint
    pub suggested_users_limit: usize,
    /// How many random users are sampled before filtering
    pub suggested_sample_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            suggested_users_limit: 4,
            suggested_sample_size: 10,
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT").unwrap_or(8080),
        };

        let store = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => bail!("Unsupported STORE_BACKEND: {}", other),
        };

        let database = match store {
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: env_parse("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(default_max_connections),
                min_connections: env_parse("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(default_min_connections),
                run_migrations: env_parse("DB_RUN_MIGRATIONS").unwrap_or(true),
            }),
            StoreBackend::Memory => None,
        };

        let auth = AuthConfig {
            jwt_secret: std::env::var("JWT_SECRET")
                .context("JWT_SECRET environment variable not set")?,
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            suggested_users_limit: env_parse("SUGGESTED_USERS_LIMIT")
                .unwrap_or(defaults.suggested_users_limit),
            suggested_sample_size: env_parse("SUGGESTED_SAMPLE_SIZE")
                .unwrap_or(defaults.suggested_sample_size),
        };

        Ok(Config {
            app,
            store,
            database,
            auth,
            media: S3Config::from_env(),
            feed,
        })
    }
}
