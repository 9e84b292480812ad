//! HS256 token issuance and verification.
//!
//! Both access and refresh tokens are signed JWTs carrying a [`Claims`]
//! payload; the `token_type` claim keeps the two from being used in place of
//! each other. Refresh tokens additionally have server-side state: only the
//! SHA-256 of the bearer string is persisted.
//!
//! Expiry is checked against the injected [`Clock`], not the library's wall
//! clock, so tests can step across the boundary. Rotating `JWT_SECRET`
//! invalidates every outstanding token; there is no key versioning.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use laurel_core::clock::Clock;
use laurel_core::error::CoreError;
use laurel_core::roles::Role;
use laurel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `iss` claim stamped on and required of every token.
pub const TOKEN_ISSUER: &str = "laurel-api";

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

/// Discriminates the two token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// JWT claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub email: String,
    pub role: Role,
    pub token_type: TokenType,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    pub iss: String,
    /// Unique token identifier; keeps two refresh tokens minted in the same
    /// second for the same user distinct.
    pub jti: String,
}

/// Why a presented token was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("expected a {expected} token, got {found}")]
    WrongTokenType { expected: &'static str, found: &'static str },

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for CoreError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => CoreError::Internal(format!("Token signing failed: {msg}")),
            _ => CoreError::Unauthorized("Invalid or expired token".into()),
        }
    }
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }

    /// Config with the default lifetimes, for tests and tooling.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry_mins: DEFAULT_ACCESS_EXPIRY_MINS,
            refresh_token_expiry_days: DEFAULT_REFRESH_EXPIRY_DAYS,
        }
    }
}

/// Access + refresh tokens handed to a client.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    #[serde(skip)]
    pub refresh_issued_at: Timestamp,
    #[serde(skip)]
    pub refresh_expires_at: Timestamp,
}

/// A freshly signed token and its validity window.
#[derive(Debug, Clone)]
struct SignedToken {
    token: String,
    issued_at: Timestamp,
    expires_at: Timestamp,
}

/// Signs and verifies tokens with one process-wide key.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` in `verify`.
        validation.validate_exp = false;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: Duration::minutes(config.access_token_expiry_mins),
            refresh_ttl: Duration::days(config.refresh_token_expiry_days),
            clock,
        }
    }

    /// Access token lifetime in seconds, as reported in `expires_in`.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign a short-lived access token.
    pub fn issue_access(&self, user_id: DbId, email: &str, role: Role) -> Result<String, TokenError> {
        self.sign(TokenType::Access, user_id, email, role)
            .map(|signed| signed.token)
    }

    /// Sign a long-lived refresh token.
    pub fn issue_refresh(
        &self,
        user_id: DbId,
        email: &str,
        role: Role,
    ) -> Result<String, TokenError> {
        self.sign(TokenType::Refresh, user_id, email, role)
            .map(|signed| signed.token)
    }

    /// Sign an access/refresh pair for the same identity.
    pub fn issue_pair(&self, user_id: DbId, email: &str, role: Role) -> Result<TokenPair, TokenError> {
        let access = self.sign(TokenType::Access, user_id, email, role)?;
        let refresh = self.sign(TokenType::Refresh, user_id, email, role)?;
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.access_ttl_secs(),
            refresh_issued_at: refresh.issued_at,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Check signature, issuer, and expiry; accepts either token type.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(classify)?;
        let claims = data.claims;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_typed(token, TokenType::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_typed(token, TokenType::Refresh)
    }

    fn verify_typed(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongTokenType {
                expected: expected.as_str(),
                found: claims.token_type.as_str(),
            });
        }
        Ok(claims)
    }

    fn sign(
        &self,
        token_type: TokenType,
        user_id: DbId,
        email: &str,
        role: Role,
    ) -> Result<SignedToken, TokenError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at
            + match token_type {
                TokenType::Access => self.access_ttl,
                TokenType::Refresh => self.refresh_ttl,
            };

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            token_type,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(SignedToken {
            token,
            issued_at,
            expires_at,
        })
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
