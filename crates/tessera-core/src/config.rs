//! Tessera Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Token and password settings
    pub auth: AuthConfig,

    /// User store connection
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_vars(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.auth.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// The signing secret is read from `JWT_SECRET_KEY` only; every sign and
    /// verify path goes through [`AuthConfig::jwt_secret`].
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                value: port,
            })?;
        }

        // Auth
        if let Some(secret) = lookup("JWT_SECRET_KEY") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(ttl) = lookup("JWT_EXPIRES_IN") {
            self.auth.access_token_ttl = ttl;
        }
        if let Some(ttl) = lookup("JWT_REFRESH_EXPIRES_IN") {
            self.auth.refresh_token_ttl = ttl;
        }
        if let Some(ttl) = lookup("JWT_LOGIN_EXPIRES_IN") {
            self.auth.login_access_ttl = ttl;
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            self.auth.bcrypt_cost = cost.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BCRYPT_COST".to_string(),
                value: cost,
            })?;
        }

        // Database
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = matches!(json.as_str(), "1" | "true" | "yes");
        }

        self.auth.validate()?;
        Ok(self)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Token signing and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret. `None` leaves the service running but every
    /// token operation fails.
    pub jwt_secret: Option<String>,

    /// Default access token lifetime
    pub access_token_ttl: String,

    /// Default refresh token lifetime
    pub refresh_token_ttl: String,

    /// Access token lifetime requested at login
    pub login_access_ttl: String,

    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl: "12h".to_string(),
            refresh_token_ttl: "36h".to_string(),
            login_access_ttl: "24h".to_string(),
            bcrypt_cost: 10,
        }
    }
}

impl AuthConfig {
    pub const MIN_BCRYPT_COST: u32 = 4;
    pub const MAX_BCRYPT_COST: u32 = 31;

    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration("access_token_ttl", &self.access_token_ttl)
    }

    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration("refresh_token_ttl", &self.refresh_token_ttl)
    }

    pub fn login_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration("login_access_ttl", &self.login_access_ttl)
    }

    /// Whether a usable signing secret is configured
    pub fn has_secret(&self) -> bool {
        self.jwt_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.access_ttl()?;
        self.refresh_ttl()?;
        self.login_ttl()?;

        if !(Self::MIN_BCRYPT_COST..=Self::MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "bcrypt_cost".to_string(),
                value: self.bcrypt_cost.to_string(),
            });
        }

        Ok(())
    }
}

/// User store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. The in-memory store is used when unset.
    pub url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Parse a lifetime such as `"12h"`, `"60m"`, `"30s"`, `"2d"` or bare seconds.
pub fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
