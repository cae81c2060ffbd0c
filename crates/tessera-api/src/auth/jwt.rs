//! JWT token issuance and validation
//!
//! Implements access and refresh tokens signed with HMAC-SHA256 under a single
//! process-wide secret. Both kinds share one structure; the `kind` claim
//! tells them apart and is enforced when a refresh token is exchanged.
//!
//! `verify` and `decode` are separate on purpose: `decode` skips signature and
//! expiry checks and must never back an authorization decision.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tessera_core::{AuthConfig, ConfigError};
use thiserror::Error;

/// Caller-supplied claims embedded in a token (at minimum `email` and `id`)
pub type TokenPayload = serde_json::Map<String, Value>;

/// Claims managed by the token service, never part of a returned payload
const RESERVED_CLAIMS: [&str; 3] = ["iat", "exp", "kind"];

/// Token kind, carried in the `kind` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Token issuance and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token is invalid: {0}")]
    Invalid(String),

    #[error("Token has expired")]
    Expired,

    #[error("Failed to issue token: {0}")]
    Issuance(String),
}

impl TokenError {
    /// Short name of the error kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Malformed => "token_malformed",
            TokenError::Invalid(_) => "token_invalid",
            TokenError::Expired => "token_expired",
            TokenError::Issuance(_) => "token_issuance",
        }
    }
}

/// Token configuration
///
/// Built once from [`AuthConfig`] at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing. Every operation fails when absent.
    pub secret: Option<String>,
    /// Signing algorithm
    pub algorithm: Algorithm,
    /// Default access token lifetime
    pub access_lifetime: Duration,
    /// Default refresh token lifetime
    pub refresh_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: Algorithm::HS256,
            access_lifetime: Duration::from_secs(12 * 60 * 60),
            refresh_lifetime: Duration::from_secs(36 * 60 * 60),
        }
    }
}

impl JwtConfig {
    pub fn from_auth_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: config.jwt_secret.clone().filter(|s| !s.is_empty()),
            algorithm: Algorithm::HS256,
            access_lifetime: config.access_ttl()?,
            refresh_lifetime: config.refresh_ttl()?,
        })
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct SignedClaims<'a> {
    #[serde(flatten)]
    payload: &'a TokenPayload,
    kind: TokenKind,
    iat: u64,
    exp: u64,
}

/// Issues, verifies, decodes and refreshes signed tokens
#[derive(Debug, Clone)]
pub struct TokenService {
    config: JwtConfig,
}

impl TokenService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Sign `payload` as a token of `kind`, expiring after `lifetime`
    /// (or the kind's default lifetime).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tessera_api::auth::jwt::{JwtConfig, TokenKind, TokenService};
    /// use serde_json::json;
    ///
    /// let service = TokenService::new(JwtConfig::with_secret("secret"));
    /// let payload = json!({"email": "a@b.com", "id": "42"});
    /// let token = service
    ///     .issue(payload.as_object().unwrap(), TokenKind::Access, None)
    ///     .unwrap();
    /// ```
    pub fn issue(
        &self,
        payload: &TokenPayload,
        kind: TokenKind,
        lifetime: Option<Duration>,
    ) -> Result<String, TokenError> {
        let payload = strip_reserved(payload.clone());
        if payload.is_empty() {
            return Err(TokenError::Issuance("payload is empty".to_string()));
        }

        let secret = self
            .secret()
            .ok_or_else(|| TokenError::Issuance("signing secret is not configured".to_string()))?;

        let lifetime = lifetime.unwrap_or(match kind {
            TokenKind::Access => self.config.access_lifetime,
            TokenKind::Refresh => self.config.refresh_lifetime,
        });
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TokenError::Issuance(e.to_string()))?
            .as_secs();

        let claims = SignedClaims {
            payload: &payload,
            kind,
            iat: now,
            exp: now.saturating_add(lifetime.as_secs()),
        };

        encode(
            &Header::new(self.config.algorithm),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Issuance(e.to_string()))
    }

    pub fn issue_access(
        &self,
        payload: &TokenPayload,
        lifetime: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.issue(payload, TokenKind::Access, lifetime)
    }

    pub fn issue_refresh(
        &self,
        payload: &TokenPayload,
        lifetime: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.issue(payload, TokenKind::Refresh, lifetime)
    }

    /// Validate signature and expiry and return the caller's payload
    pub fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let (payload, _) = self.verify_claims(token)?;
        Ok(payload)
    }

    /// Exchange a refresh token for a fresh access token with the default
    /// access lifetime
    pub fn refresh(&self, token: &str) -> Result<String, TokenError> {
        let (payload, kind) = self.verify_claims(token)?;
        if kind != Some(TokenKind::Refresh) {
            return Err(TokenError::Invalid("not a refresh token".to_string()));
        }
        self.issue(&payload, TokenKind::Access, None)
    }

    /// Read the payload without checking signature or expiry
    pub fn decode(&self, token: &str) -> Result<TokenPayload, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        let mut validation = Validation::new(self.config.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenPayload>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|_| TokenError::Malformed)?;

        Ok(strip_reserved(data.claims))
    }

    fn verify_claims(&self, token: &str) -> Result<(TokenPayload, Option<TokenKind>), TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        let secret = self
            .secret()
            .ok_or_else(|| TokenError::Invalid("signing secret is not configured".to_string()))?;

        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;

        let data = decode::<TokenPayload>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::Json(_) if names_unsupported_algorithm(token) => {
                TokenError::Invalid("unsupported signing algorithm".to_string())
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        let mut claims = data.claims;
        let kind = claims
            .remove("kind")
            .and_then(|v| serde_json::from_value::<TokenKind>(v).ok());

        Ok((strip_reserved(claims), kind))
    }

    fn secret(&self) -> Option<&str> {
        self.config.secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// True when `token` has three segments and a readable header whose `alg`
/// is not one jsonwebtoken can verify (e.g. `none`)
fn names_unsupported_algorithm(token: &str) -> bool {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return false;
    };

    let Ok(bytes) = URL_SAFE_NO_PAD.decode(header) else {
        return false;
    };
    match serde_json::from_slice::<TokenPayload>(&bytes) {
        Ok(header) => match header.get("alg") {
            Some(alg @ Value::String(_)) => {
                serde_json::from_value::<Algorithm>(alg.clone()).is_err()
            }
            _ => false,
        },
        Err(_) => false,
    }
}

fn strip_reserved(mut payload: TokenPayload) -> TokenPayload {
    for claim in RESERVED_CLAIMS {
        payload.remove(claim);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> TokenPayload {
        json!({"email": "a@b.com", "id": "7f1c2a1e-0000-4000-8000-000000000001"})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(JwtConfig::with_secret(secret))
    }

    /// Claims as signed under "secret", reserved ones included
    fn raw_claims(token: &str) -> TokenPayload {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        decode::<TokenPayload>(token, &DecodingKey::from_secret(b"secret"), &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service("secret");
        let mut payload = payload();
        payload.insert("roles".to_string(), json!(["user", "beta"]));
        payload.insert("profile".to_string(), json!({"name": "Ada", "age": 36}));

        let token = service.issue_access(&payload, None).unwrap();
        let verified = service.verify(&token).unwrap();

        assert_eq!(verified, payload);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let result = service("secret").issue_access(&TokenPayload::new(), None);
        assert!(matches!(result, Err(TokenError::Issuance(_))));
    }

    #[test]
    fn test_reserved_only_payload_rejected() {
        let reserved = json!({"exp": 1, "iat": 1}).as_object().cloned().unwrap();
        let result = service("secret").issue_access(&reserved, None);
        assert!(matches!(result, Err(TokenError::Issuance(_))));
    }

    #[test]
    fn test_default_lifetimes() {
        let service = service("secret");
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        let access = service.issue_access(&payload(), None).unwrap();
        let refresh = service.issue_refresh(&payload(), None).unwrap();

        let access_ttl = raw_claims(&access)["exp"].as_u64().unwrap() - now;
        let refresh_ttl = raw_claims(&refresh)["exp"].as_u64().unwrap() - now;
        assert!((12 * 3600..=12 * 3600 + 1).contains(&access_ttl));
        assert!((36 * 3600..=36 * 3600 + 1).contains(&refresh_ttl));
    }

    #[test]
    fn test_short_lifetime_expires() {
        let service = service("secret");
        let token = service
            .issue_access(&payload(), Some(Duration::from_secs(1)))
            .unwrap();

        assert!(service.verify(&token).is_ok());

        std::thread::sleep(Duration::from_secs(2));

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid_not_expired() {
        let token = service("secret1").issue_access(&payload(), None).unwrap();
        let result = service("secret2").verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_malformed_tokens() {
        let service = service("secret");
        assert!(matches!(service.verify(""), Err(TokenError::Malformed)));
        assert!(matches!(service.verify("   "), Err(TokenError::Malformed)));
        assert!(matches!(service.verify("not-a-token"), Err(TokenError::Malformed)));
        assert!(matches!(service.decode(""), Err(TokenError::Malformed)));
        assert!(matches!(service.decode("a.b.c"), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_missing_secret_degrades_every_operation() {
        let degraded = TokenService::new(JwtConfig::default());
        let token = service("secret").issue_access(&payload(), None).unwrap();

        assert!(matches!(
            degraded.issue_access(&payload(), None),
            Err(TokenError::Issuance(_))
        ));
        assert!(matches!(degraded.verify(&token), Err(TokenError::Invalid(_))));
        assert!(matches!(degraded.refresh(&token), Err(TokenError::Invalid(_))));
        // decode never needs the secret
        assert_eq!(degraded.decode(&token).unwrap(), payload());
    }

    #[test]
    fn test_empty_secret_counts_as_missing() {
        let degraded = service("");
        assert!(matches!(
            degraded.issue_access(&payload(), None),
            Err(TokenError::Issuance(_))
        ));
    }

    #[test]
    fn test_decode_ignores_signature_and_expiry() {
        let other = service("someone-else");
        let token = other
            .issue_access(&payload(), Some(Duration::from_secs(0)))
            .unwrap();
        std::thread::sleep(Duration::from_secs(1));

        let decoded = service("secret").decode(&token).unwrap();
        assert_eq!(decoded, payload());
    }

    #[test]
    fn test_refresh_issues_access_token() {
        let service = service("secret");
        let refresh = service.issue_refresh(&payload(), None).unwrap();

        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let access = service.refresh(&refresh).unwrap();
        assert_ne!(access, refresh);
        assert_eq!(service.verify(&access).unwrap(), payload());

        // Access lifetime, not the 36h one of the exchanged token
        let claims = raw_claims(&access);
        let ttl = claims["exp"].as_u64().unwrap() - now;
        assert!((12 * 3600..=12 * 3600 + 1).contains(&ttl));
        assert_eq!(claims["kind"], "access");

        // The new token is an access token and cannot itself be refreshed
        assert!(matches!(service.refresh(&access), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let service = service("secret");
        let access = service.issue_access(&payload(), None).unwrap();
        assert!(matches!(service.refresh(&access), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_refresh_with_foreign_secret_is_invalid() {
        let token = service("secret1").issue_refresh(&payload(), None).unwrap();
        let result = service("secret2").refresh(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_refresh_expired_token() {
        let service = service("secret");
        let token = service
            .issue_refresh(&payload(), Some(Duration::from_secs(0)))
            .unwrap();
        std::thread::sleep(Duration::from_secs(2));
        assert!(matches!(service.refresh(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_sign_and_verify_paths_share_one_secret() {
        let config = AuthConfig {
            jwt_secret: Some("shared".to_string()),
            ..Default::default()
        };
        let service = TokenService::new(JwtConfig::from_auth_config(&config).unwrap());
        let reference = self::service("shared");

        // Tokens issued by either path verify and refresh under the configured secret
        let access = service.issue_access(&payload(), None).unwrap();
        let refresh = reference.issue_refresh(&payload(), None).unwrap();
        assert!(reference.verify(&access).is_ok());
        assert!(service.verify(&refresh).is_ok());
        assert!(service.refresh(&refresh).is_ok());
    }

    #[test]
    fn test_unsigned_token_is_invalid_not_malformed() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let claims =
            URL_SAFE_NO_PAD.encode(r#"{"email":"a@b.com","kind":"refresh","exp":9999999999}"#);
        let forged = format!("{}.{}.", header, claims);

        let service = service("secret");
        assert!(matches!(service.verify(&forged), Err(TokenError::Invalid(_))));
        assert!(matches!(service.refresh(&forged), Err(TokenError::Invalid(_))));

        // An unreadable header is still malformed
        let garbled = format!("{}.{}.", URL_SAFE_NO_PAD.encode("{alg"), claims);
        assert!(matches!(service.verify(&garbled), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_foreign_algorithm_is_invalid() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &json!({"email": "a@b.com", "exp": u64::MAX / 2}),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            service("secret").verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }
}
