//! Tessera API - credential registration, login and token service
//!
//! Carries `create_user` / `login_user` command messages over HTTP and
//! answers every command with a response envelope.

pub mod auth;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use envelope::{ResponseEnvelope, Status};
pub use routes::create_router;

use axum::Router;
use state::AppState;
use std::sync::Arc;
use tessera_core::{AppConfig, AuthConfig};

/// Router over an in-memory store with a fixed signing secret and the
/// cheapest bcrypt cost
pub fn create_router_for_testing() -> Router {
    let config = AppConfig {
        auth: AuthConfig {
            jwt_secret: Some("testing-secret".to_string()),
            bcrypt_cost: AuthConfig::MIN_BCRYPT_COST,
            ..Default::default()
        },
        ..Default::default()
    };

    match AppState::in_memory(config) {
        Ok(state) => create_router(Arc::new(state)),
        // Defaults always parse
        Err(e) => unreachable!("invalid testing config: {e}"),
    }
}
