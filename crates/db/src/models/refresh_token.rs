//! Refresh-token record model and DTOs.

use laurel_core::refresh::{check_usable, RefreshRejection};
use laurel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `refresh_tokens` table.
///
/// `token_hash` is the SHA-256 digest of the bearer string; the raw token is
/// never stored.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: DbId,
    pub user_id: DbId,
    pub token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub revoked_at: Option<Timestamp>,
    pub last_used_at: Option<Timestamp>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RefreshToken {
    /// Usable iff not revoked and `now < expires_at`.
    pub fn check_usable(&self, now: Timestamp) -> Result<(), RefreshRejection> {
        check_usable(self.is_revoked, self.expires_at, now)
    }
}

/// DTO for recording a newly issued refresh token.
#[derive(Debug, Clone)]
pub struct CreateRefreshToken {
    pub user_id: DbId,
    pub token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Client connection metadata captured on login and refresh.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// An active session as shown to its owner (hash stripped).
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: DbId,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<RefreshToken> for SessionInfo {
    fn from(token: RefreshToken) -> Self {
        Self {
            id: token.id,
            issued_at: token.issued_at,
            expires_at: token.expires_at,
            last_used_at: token.last_used_at,
            ip_address: token.ip_address,
            user_agent: token.user_agent,
        }
    }
}
