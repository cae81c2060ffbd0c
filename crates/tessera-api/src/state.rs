//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{CredentialService, InMemoryUserStore, UserStore};
use std::sync::Arc;
use std::time::Instant;
use tessera_core::{AppConfig, ConfigError};

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Registration and login orchestration
    pub credentials: CredentialService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create application state over the given user store
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Result<Self, ConfigError> {
        let credentials = CredentialService::from_config(store, &config.auth)?;
        Ok(Self {
            config,
            credentials,
            start_time: Instant::now(),
        })
    }

    /// Create application state backed by an in-memory user store
    pub fn in_memory(config: AppConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(InMemoryUserStore::new()))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
