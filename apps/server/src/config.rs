//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. `main` loads a `.env` file first, if present.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

const DEV_JWT_SECRET: &str = "stockroom-dev-secret-change-in-production";
const DEV_ADMIN_PASSWORD: &str = "admin";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Where uploaded product images are written
    pub upload_dir: PathBuf,

    /// Upper bound for one image upload in bytes (default: 5MB)
    pub max_upload_bytes: usize,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Password given to the admin account when it is first created
    pub admin_password: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: parse_var("STOCKROOM_HTTP_PORT", "8080")?,

            database_path: env::var("STOCKROOM_DATABASE_PATH")
                .unwrap_or_else(|_| "./data/stockroom.db".to_string())
                .into(),

            db_max_connections: parse_var("STOCKROOM_DB_MAX_CONNECTIONS", "5")?,

            upload_dir: env::var("STOCKROOM_UPLOAD_DIR")
                .unwrap_or_else(|_| "./data/uploads".to_string())
                .into(),

            max_upload_bytes: parse_var("STOCKROOM_MAX_UPLOAD_BYTES", "5242880")?,

            jwt_secret: env::var("STOCKROOM_JWT_SECRET").unwrap_or_else(|_| {
                warn!("STOCKROOM_JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }),

            jwt_lifetime_secs: parse_var("STOCKROOM_JWT_LIFETIME_SECS", "28800")?, // 8 hours

            admin_password: env::var("STOCKROOM_ADMIN_PASSWORD").unwrap_or_else(|_| {
                warn!("STOCKROOM_ADMIN_PASSWORD not set, admin account gets the default password");
                DEV_ADMIN_PASSWORD.to_string()
            }),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("STOCKROOM_DB_MAX_CONNECTIONS".to_string()));
        }

        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("STOCKROOM_JWT_LIFETIME_SECS".to_string()));
        }

        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("STOCKROOM_JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// Configuration for tests: in-memory database, temp upload directory.
    pub fn for_tests() -> Self {
        ServerConfig {
            http_port: 0,
            database_path: PathBuf::from(":memory:"),
            db_max_connections: 1,
            upload_dir: env::temp_dir().join("stockroom-test-uploads"),
            max_upload_bytes: 1024 * 1024,
            jwt_secret: "test-secret".to_string(),
            jwt_lifetime_secs: 3600,
            admin_password: "admin-password".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
