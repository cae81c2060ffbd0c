//! RPC endpoint adapter
//!
//! Maps inbound command messages to credential service calls. Each entry point
//! returns the service's envelope unchanged; a panic anywhere below is turned
//! into a `500` envelope instead of escaping to the transport.
//!
//! Author: hephaex@gmail.com

use crate::auth::{CredentialService, LoginRequest, RegisterRequest};
use crate::envelope::ResponseEnvelope;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub const CREATE_USER: &str = "create_user";
pub const LOGIN_USER: &str = "login_user";

/// Command selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPattern {
    pub cmd: String,
}

/// Inbound command message: `{pattern: {cmd}, data, id?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage {
    pub pattern: RpcPattern,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RpcMessage {
    pub fn new(cmd: impl Into<String>, data: Value) -> Self {
        Self {
            pattern: RpcPattern { cmd: cmd.into() },
            data,
            id: None,
        }
    }
}

/// `create_user` entry point
pub async fn handle_create_user(
    service: &CredentialService,
    request: RegisterRequest,
) -> ResponseEnvelope {
    tracing::info!(cmd = CREATE_USER, "Received command");
    guarded(CREATE_USER, service.register(request)).await
}

/// `login_user` entry point
pub async fn handle_login_user(
    service: &CredentialService,
    request: LoginRequest,
) -> ResponseEnvelope {
    tracing::info!(cmd = LOGIN_USER, "Received command");
    guarded(LOGIN_USER, service.login(request)).await
}

/// Route a command message to its entry point
pub async fn dispatch(service: &CredentialService, message: RpcMessage) -> ResponseEnvelope {
    let RpcMessage { pattern, data, id } = message;
    tracing::debug!(cmd = %pattern.cmd, id = ?id, "Dispatching command");

    match pattern.cmd.as_str() {
        CREATE_USER => match serde_json::from_value::<RegisterRequest>(data) {
            Ok(request) => handle_create_user(service, request).await,
            Err(e) => invalid_payload(CREATE_USER, e),
        },
        LOGIN_USER => match serde_json::from_value::<LoginRequest>(data) {
            Ok(request) => handle_login_user(service, request).await,
            Err(e) => invalid_payload(LOGIN_USER, e),
        },
        other => {
            tracing::warn!(cmd = %other, "Unknown command");
            ResponseEnvelope::bad_request(format!("Unknown command: {other}"))
        }
    }
}

/// `POST /rpc` - carries command messages over HTTP
pub async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RpcMessage>, JsonRejection>,
) -> ResponseEnvelope {
    match payload {
        Ok(Json(message)) => dispatch(&state.credentials, message).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected malformed command message");
            ResponseEnvelope::bad_request("Malformed command message")
        }
    }
}

async fn guarded<F>(cmd: &'static str, future: F) -> ResponseEnvelope
where
    F: Future<Output = ResponseEnvelope>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(envelope) => envelope,
        Err(_) => {
            tracing::error!(cmd, "Command handler panicked");
            ResponseEnvelope::internal_error("An unexpected error occurred")
        }
    }
}

fn invalid_payload(cmd: &'static str, err: serde_json::Error) -> ResponseEnvelope {
    tracing::warn!(cmd, error = %err, "Invalid command payload");
    ResponseEnvelope::bad_request("Invalid payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        InMemoryUserStore, JwtConfig, PasswordHasher, RepositoryError, TokenService,
        UserCredential, UserStore,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    fn service_with(store: Arc<dyn UserStore>) -> CredentialService {
        CredentialService::new(
            store,
            TokenService::new(JwtConfig::with_secret("rpc-secret")),
            PasswordHasher::new(4),
            Duration::from_secs(60),
        )
    }

    fn service() -> CredentialService {
        service_with(Arc::new(InMemoryUserStore::new()))
    }

    struct PanickingStore;

    #[async_trait]
    impl UserStore for PanickingStore {
        async fn find_by_email(&self, _: &str) -> Result<Option<UserCredential>, RepositoryError> {
            panic!("store bug");
        }

        async fn create(&self, _: UserCredential) -> Result<UserCredential, RepositoryError> {
            panic!("store bug");
        }

        async fn update_last_login(&self, _: Uuid, _: DateTime<Utc>) -> Result<(), RepositoryError> {
            panic!("store bug");
        }
    }

    #[tokio::test]
    async fn test_dispatch_create_and_login() {
        let service = service();

        let created = dispatch(
            &service,
            RpcMessage::new(CREATE_USER, json!({"email": "a@b.com", "password": "Secret123"})),
        )
        .await;
        assert_eq!(created.status, 201);

        let login = dispatch(
            &service,
            RpcMessage::new(LOGIN_USER, json!({"email": "a@b.com", "password": "Secret123"})),
        )
        .await;
        assert_eq!(login.status, 200);
        assert!(login.data.unwrap()["accessToken"].is_string());
    }

    #[tokio::test]
    async fn test_entry_points_return_service_envelope_unchanged() {
        let service = service();
        let direct = service.login(LoginRequest::new("x@y.com", "nope")).await;
        let adapted = handle_login_user(&service, LoginRequest::new("x@y.com", "nope")).await;
        assert_eq!(direct, adapted);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let envelope = dispatch(&service(), RpcMessage::new("delete_user", json!({}))).await;
        assert_eq!(envelope.status, 400);
        assert_eq!(envelope.message, "Unknown command: delete_user");
    }

    #[tokio::test]
    async fn test_invalid_payload() {
        let envelope = dispatch(
            &service(),
            RpcMessage::new(LOGIN_USER, json!({"email": 42, "password": true})),
        )
        .await;
        assert_eq!(envelope.status, 400);
        assert_eq!(envelope.message, "Invalid payload");

        let envelope = dispatch(&service(), RpcMessage::new(CREATE_USER, Value::Null)).await;
        assert_eq!(envelope.status, 400);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let service = service_with(Arc::new(PanickingStore));

        let envelope =
            handle_login_user(&service, LoginRequest::new("a@b.com", "Secret123")).await;
        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.error.as_deref(), Some("Internal Server Error"));

        let envelope =
            handle_create_user(&service, RegisterRequest::new("a@b.com", "Secret123")).await;
        assert_eq!(envelope.status, 500);
    }
}
