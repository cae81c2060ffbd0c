//! Data models for credentials and authentication requests
//!
//! - UserCredential: stored account record, including the password hash
//! - UserPublic: the account as it may leave the service
//! - RegisterRequest / LoginRequest: inbound command payloads
//! - LoginTokens: token pair returned by a successful login

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Stored user account
///
/// Owned by the user store. The password hash is never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredential {
    /// Unique user identifier, assigned at creation
    pub id: Uuid,

    /// Email address (unique, case-sensitive as stored)
    pub email: String,

    /// bcrypt digest of the password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Optional profile fields supplied at registration
    pub profile: Map<String, Value>,

    /// Last successful login
    pub last_login: Option<DateTime<Utc>>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl UserCredential {
    pub fn new(email: String, password_hash: String, profile: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            profile,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    /// Convert to the public representation (without the password hash)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            profile: self.profile.clone(),
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

/// Public user representation, safe for envelopes and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub profile: Map<String, Value>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// `create_user` payload
///
/// Every field other than `email` and `password` is kept as a profile field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl RegisterRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            profile: Map::new(),
        }
    }
}

/// `login_user` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Tokens returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Keys of a registration payload that may not be stored as profile fields
const RESERVED_PROFILE_KEYS: [&str; 6] = [
    "id",
    "password",
    "passwordHash",
    "password_hash",
    "lastLogin",
    "createdAt",
];

/// Drop profile keys that would shadow account fields
pub fn sanitize_profile(mut profile: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_PROFILE_KEYS {
        profile.remove(key);
    }
    profile
}
