//! Usability rules for persisted refresh-token records.
//!
//! A record is usable iff it is not revoked and `now < expires_at`. The three
//! rejection kinds stay distinct here; the session layer collapses them into
//! a single generic failure before anything reaches a client.

use crate::types::Timestamp;

/// Why a presented refresh token cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RefreshRejection {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("refresh token has expired")]
    Expired,
}

/// Classify a stored record. Revocation wins over expiry.
pub fn check_usable(
    is_revoked: bool,
    expires_at: Timestamp,
    now: Timestamp,
) -> Result<(), RefreshRejection> {
    if is_revoked {
        return Err(RefreshRejection::Revoked);
    }
    if now >= expires_at {
        return Err(RefreshRejection::Expired);
    }
    Ok(())
}
