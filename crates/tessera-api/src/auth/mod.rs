//! Credential and token lifecycle
//!
//! This module provides:
//! - Password hashing with bcrypt
//! - Access/refresh token issuance, verification, decoding and refresh
//! - Credential service for registration and login
//! - User store abstraction with in-memory and PostgreSQL backends

pub mod jwt;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use jwt::{JwtConfig, TokenError, TokenKind, TokenPayload, TokenService};
pub use models::{LoginRequest, LoginTokens, RegisterRequest, UserCredential, UserPublic};
pub use password::{PasswordError, PasswordHasher};
pub use repository::{InMemoryUserStore, PgUserStore, RepositoryError, UserStore};
pub use service::{is_valid_email, CredentialService};
