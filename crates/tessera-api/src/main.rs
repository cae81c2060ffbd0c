//! Tessera API Server
//!
//! Credential service answering `create_user` and `login_user` commands.
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tessera_api::auth::{InMemoryUserStore, PgUserStore, UserStore};
use tessera_api::{create_router, state::AppState};
use tessera_core::config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("TESSERA_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);

    if !config.auth.has_secret() {
        tracing::warn!("JWT_SECRET_KEY is not set; every token operation will fail");
    }

    let store: Arc<dyn UserStore> = match &config.database.url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.pool_size)
                .connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            let store = PgUserStore::new(pool);
            store.migrate().await.context("Failed to prepare users table")?;
            tracing::info!("Using PostgreSQL user store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; users are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config, store)?);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Tessera API starting on http://{}", addr);
    tracing::info!("Commands accepted at http://{}/rpc", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("tessera_api={},tower_http=info", logging.level).into()
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
