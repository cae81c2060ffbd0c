//! Tessera Core - shared configuration
//!
//! This crate holds the process-wide configuration consumed by the
//! credential service:
//! - Server binding
//! - Token signing secret and lifetimes
//! - Password hashing cost
//! - User store connection
//! - Logging

pub mod config;

pub use config::{
    parse_duration, AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig,
    ServerConfig,
};
