//! Route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{health, rpc};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/rpc", post(rpc::rpc_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
