//! Application error handling
//!
//! Every fault is folded into a [`ResponseEnvelope`] at the credential
//! service boundary. Infrastructure causes are logged here and replaced by a
//! generic message for the caller.
//!
//! Author: hephaex@gmail.com

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::auth::repository::RepositoryError;
use crate::envelope::ResponseEnvelope;
use thiserror::Error;

/// Generic wording for credential mismatches, shared by every login failure
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convert into an envelope. `context` completes the generic message,
    /// e.g. `"while creating user"` or `"during login"`.
    pub fn into_envelope(self, context: &str) -> ResponseEnvelope {
        match self {
            AppError::BadRequest(message) => ResponseEnvelope::bad_request(message),
            AppError::Unauthorized => ResponseEnvelope::unauthorized(INVALID_CREDENTIALS),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error {}", context);
                ResponseEnvelope::internal_error(format!("Database error occurred {context}"))
            }
            AppError::Token(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Token error {}", context);
                ResponseEnvelope::internal_error(format!("An unexpected error occurred {context}"))
            }
            AppError::Password(e) => {
                tracing::error!(error = %e, "Password hashing error {}", context);
                ResponseEnvelope::internal_error(format!("An unexpected error occurred {context}"))
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Unexpected error {}", context);
                ResponseEnvelope::internal_error(format!("An unexpected error occurred {context}"))
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_causes_are_not_echoed() {
        let err = AppError::Database(RepositoryError::DatabaseError(
            "connection refused at 10.0.0.5".to_string(),
        ));
        let envelope = err.into_envelope("while creating user");

        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.message, "Database error occurred while creating user");
        assert!(!serde_json::to_string(&envelope).unwrap().contains("10.0.0.5"));
    }

    #[test]
    fn test_token_errors_fold_into_internal() {
        for err in [
            TokenError::Malformed,
            TokenError::Expired,
            TokenError::Invalid("bad signature".to_string()),
            TokenError::Issuance("no secret".to_string()),
        ] {
            let envelope = AppError::from(err).into_envelope("during login");
            assert_eq!(envelope.status, 500);
            assert_eq!(envelope.message, "An unexpected error occurred during login");
        }
    }

    #[test]
    fn test_unauthorized_is_generic() {
        let envelope = AppError::Unauthorized.into_envelope("during login");
        assert_eq!(envelope.status, 401);
        assert_eq!(envelope.message, "Invalid credentials");
    }
}
