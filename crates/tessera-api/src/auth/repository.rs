//! User store for credential records
//!
//! The credential service only sees the [`UserStore`] trait:
//! - `find_by_email` lookup
//! - atomic `create` that enforces email uniqueness itself
//! - `update_last_login`
//!
//! Two implementations ship: an in-memory map for development and tests, and
//! a PostgreSQL store backed by sqlx.

use super::models::UserCredential;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::EmailAlreadyExists
            }
            _ => RepositoryError::DatabaseError(err.to_string()),
        }
    }
}

/// Persistence collaborator for user credentials
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by exact email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, RepositoryError>;

    /// Store a new user. Either the full record is stored or nothing is;
    /// a duplicate email yields [`RepositoryError::EmailAlreadyExists`].
    async fn create(&self, user: UserCredential) -> Result<UserCredential, RepositoryError>;

    /// Record a successful login
    async fn update_last_login(
        &self,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// In-memory user store keyed by email
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserCredential>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, RepositoryError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create(&self, user: UserCredential) -> Result<UserCredential, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(RepositoryError::EmailAlreadyExists);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn update_last_login(
        &self,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .values_mut()
            .find(|u| u.id == user_id)
            .ok_or(RepositoryError::UserNotFound)?;
        user.last_login = Some(timestamp);
        Ok(())
    }
}

/// Row as stored in the `users` table
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    profile: Json<Map<String, Value>>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserCredential {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            password_hash: record.password_hash,
            profile: record.profile.0,
            last_login: record.last_login,
            created_at: record.created_at,
        }
    }
}

const USERS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        profile JSONB NOT NULL DEFAULT '{}'::jsonb,
        last_login TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// PostgreSQL user store
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::query(USERS_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash, profile, last_login, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(UserCredential::from))
    }

    async fn create(&self, user: UserCredential) -> Result<UserCredential, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, password_hash, profile, last_login, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, profile, last_login, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Json(&user.profile))
        .bind(user.last_login)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record.into())
    }

    async fn update_last_login(
        &self,
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(timestamp)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::UserNotFound);
        }
        Ok(())
    }
}
