//! Credential service layer
//!
//! Orchestrates registration (validation, uniqueness, hashing, persistence) and
//! login (lookup, password check, token issuance, last-login update). Every
//! outcome leaves this layer as a [`ResponseEnvelope`]; no error crosses it.

use super::jwt::{JwtConfig, TokenPayload, TokenService};
use super::models::{
    sanitize_profile, LoginRequest, LoginTokens, RegisterRequest, UserCredential, UserPublic,
};
use super::password::PasswordHasher;
use super::repository::{RepositoryError, UserStore};
use crate::envelope::ResponseEnvelope;
use crate::error::AppError;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{AuthConfig, ConfigError};

const DUPLICATE_EMAIL: &str = "User with email address already exists";

/// Credential service
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
    login_access_lifetime: Duration,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenService,
        hasher: PasswordHasher,
        login_access_lifetime: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            login_access_lifetime,
        }
    }

    /// Build the service from process configuration
    pub fn from_config(store: Arc<dyn UserStore>, config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            store,
            TokenService::new(JwtConfig::from_auth_config(config)?),
            PasswordHasher::new(config.bcrypt_cost),
            config.login_ttl()?,
        ))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user
    ///
    /// * `201` - User created; data is the public user record
    /// * `400` - Missing fields, invalid email, or email already registered
    /// * `500` - Persistence or hashing failure
    pub async fn register(&self, request: RegisterRequest) -> ResponseEnvelope {
        match self.try_register(request).await {
            Ok(user) => ResponseEnvelope::created("User successfully created", user),
            Err(err) => err.into_envelope("while creating user"),
        }
    }

    async fn try_register(&self, request: RegisterRequest) -> Result<UserPublic, AppError> {
        let RegisterRequest {
            email,
            password,
            profile,
        } = request;

        let (email, password) = match (non_empty(email), non_empty(password)) {
            (Some(email), Some(password)) => (email, password),
            _ => {
                tracing::warn!("Create user attempt with missing email or password");
                return Err(AppError::BadRequest(
                    "Email or password missing from payload".to_string(),
                ));
            }
        };

        if !is_valid_email(&email) {
            tracing::warn!(email = %email, "Invalid email format attempted");
            return Err(AppError::BadRequest("Invalid email format.".to_string()));
        }

        if self.store.find_by_email(&email).await?.is_some() {
            tracing::warn!(email = %email, "User creation attempted with existing email");
            return Err(AppError::BadRequest(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = self.hash_password(password).await?;
        let user = UserCredential::new(email, password_hash, sanitize_profile(profile));

        // The store's uniqueness check is authoritative; a concurrent
        // registration may have slipped past the lookup above.
        let created = match self.store.create(user).await {
            Ok(created) => created,
            Err(RepositoryError::EmailAlreadyExists) => {
                tracing::warn!("Duplicate email rejected by user store");
                return Err(AppError::BadRequest(DUPLICATE_EMAIL.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(email = %created.email, user_id = %created.id, "User successfully created");
        Ok(created.to_public())
    }

    /// Login with email and password
    ///
    /// * `200` - data is `{accessToken, refreshToken}`
    /// * `400` - Missing email or password
    /// * `401` - Unknown email or wrong password (same message for both)
    /// * `500` - Persistence, hashing, or signing failure
    pub async fn login(&self, request: LoginRequest) -> ResponseEnvelope {
        match self.try_login(request).await {
            Ok(tokens) => ResponseEnvelope::ok("Login successful", tokens),
            Err(err) => err.into_envelope("during login"),
        }
    }

    async fn try_login(&self, request: LoginRequest) -> Result<LoginTokens, AppError> {
        let (email, password) = match (non_empty(request.email), non_empty(request.password)) {
            (Some(email), Some(password)) => (email, password),
            (email, _) => {
                tracing::warn!(email = ?email, "Login attempt with missing credentials");
                return Err(AppError::BadRequest(
                    "Email and password are required".to_string(),
                ));
            }
        };

        let Some(user) = self.store.find_by_email(&email).await? else {
            tracing::warn!(email = %email, "Login attempt for non-existent user");
            return Err(AppError::Unauthorized);
        };

        if !self.verify_password(password, user.password_hash.clone()).await? {
            tracing::warn!(email = %email, "Invalid password attempt");
            return Err(AppError::Unauthorized);
        }

        let mut payload = TokenPayload::new();
        payload.insert("email".to_string(), Value::String(user.email.clone()));
        payload.insert("id".to_string(), Value::String(user.id.to_string()));

        let access_token = self
            .tokens
            .issue_access(&payload, Some(self.login_access_lifetime))?;
        let refresh_token = self.tokens.issue_refresh(&payload, None)?;
        tracing::debug!(user_id = %user.id, "Tokens generated");

        // Awaited before replying; the tokens are already valid, so a failed
        // write is logged and the login still succeeds.
        if let Err(e) = self.store.update_last_login(user.id, Utc::now()).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to update last login");
        }

        tracing::info!(email = %email, "User login successful");
        Ok(LoginTokens {
            access_token,
            refresh_token,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher;
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.hasher;
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await??;
        Ok(valid)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Basic `local@domain.tld` shape check: no whitespace, exactly one `@`, and a
/// dot inside the domain with text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
