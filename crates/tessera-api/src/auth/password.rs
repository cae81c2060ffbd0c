//! Password hashing and verification using bcrypt
//!
//! - Algorithm: bcrypt (`$2b$` prefix)
//! - Cost: 10 by default, configurable through `AuthConfig::bcrypt_cost`
//! - Salt: 16 bytes random, embedded in the digest
//!
//! Verification compares in constant time. Both operations are CPU-bound and
//! should be moved off the async executor by the caller.

use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// bcrypt work factor used when none is configured
pub const DEFAULT_COST: u32 = 10;

/// One-way password hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Modular crypt format digest (includes cost and salt)
    /// * `Err(PasswordError)` - If salt generation or hashing fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tessera_api::auth::password::PasswordHasher;
    ///
    /// let hash = PasswordHasher::default().hash("Secret123").unwrap();
    /// assert!(hash.starts_with("$2b$10$"));
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        bcrypt::hash(password, self.cost).map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a plaintext password against a stored digest
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match, or the digest is malformed
    /// * `Err(PasswordError)` - If the primitive fails for another reason
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        match bcrypt::verify(password, hash) {
            Ok(valid) => Ok(valid),
            Err(
                bcrypt::BcryptError::InvalidHash(_)
                | bcrypt::BcryptError::InvalidPrefix(_)
                | bcrypt::BcryptError::InvalidCost(_)
                | bcrypt::BcryptError::CostNotAllowed(_)
                | bcrypt::BcryptError::InvalidSaltLen(_)
                | bcrypt::BcryptError::InvalidBase64(_),
            ) => Ok(false),
            Err(e) => Err(PasswordError::HashingFailed(e.to_string())),
        }
    }
}
