//! Session lifecycle: login, refresh rotation, logout, and revocation.
//!
//! Per refresh record:
//!
//! ```text
//! [issued] --(refreshed)------> [revoked]   (superseded by a new record)
//! [issued] --(logout/revoke)--> [revoked]
//! [issued] --(expiry passes)--> [expired]
//! [revoked|expired] --(use)---> Unauthorized
//! ```
//!
//! A user holds any number of records at once (one per device). Rotation
//! stores the new record before revoking the presented one, and the revoke is
//! a compare-and-swap: of several concurrent refreshes of the same token,
//! exactly one flips the old record and keeps its new pair. The others revoke
//! the record they just stored and fail.
//!
//! Nothing here logs. Best-effort failures travel back in the outcome types
//! for the HTTP layer to report.

use std::sync::Arc;

use laurel_core::clock::Clock;
use laurel_core::error::CoreError;
use laurel_core::hashing::sha256_hex;
use laurel_core::roles::Actor;
use laurel_db::models::refresh_token::{ClientMeta, CreateRefreshToken, SessionInfo};
use laurel_db::models::user::{User, UserResponse};
use laurel_db::store::{RefreshTokenStore, UserStore};
use laurel_db::LookupError;

use crate::auth::jwt::{TokenPair, TokenSigner};
use crate::auth::password::verify_password_or_dummy;

/// Message for every credential failure, whichever check failed.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Message for every refresh-token failure, whichever check failed.
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: UserResponse,
}

/// A successful rotation.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub tokens: TokenPair,
    /// `false` when recording `last_used_at` and client metadata failed.
    pub metadata_recorded: bool,
}

/// Result of a logout. Logout itself never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Every live record of the caller was revoked.
    Revoked(u64),
    /// No usable access token was presented; nothing to revoke.
    Anonymous,
    /// The store refused the bulk revoke; sessions may stay live until expiry.
    RevocationFailed(String),
}

/// Orchestrates the password hasher, token signer, and refresh-token store.
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        signer: Arc<TokenSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            tokens,
            signer,
            clock,
        }
    }

    /// Verify credentials, issue a pair, and persist the refresh record.
    ///
    /// Fails with `Unauthorized` on bad credentials, `Forbidden` for an
    /// inactive account, and `Persistence` if the record cannot be stored
    /// (the unstored tokens are discarded).
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        meta: &ClientMeta,
    ) -> Result<LoginOutcome, CoreError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(CoreError::Validation(
                "Email and password are required".into(),
            ));
        }

        // An unknown email still pays for one argon2 verification.
        let user = self.users.find_by_email(email.trim()).await?;
        let matches =
            verify_password_or_dummy(password, user.as_ref().map(|u| u.password_hash.as_str()))
                .map_err(|e| CoreError::Internal(format!("Password verification error: {e}")))?;
        let user = match user {
            Some(user) if matches => user,
            _ => return Err(invalid_credentials()),
        };

        if !user.can_sign_in() {
            return Err(CoreError::Forbidden("Account is inactive".into()));
        }

        let tokens = self.issue_and_store(&user, meta).await?;
        Ok(LoginOutcome {
            tokens,
            user: UserResponse::from(&user),
        })
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// Every rejection (bad signature, wrong type, unknown, revoked, expired,
    /// account gone or inactive, lost race) surfaces as the same
    /// `Unauthorized("Invalid refresh token")`.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        meta: &ClientMeta,
    ) -> Result<RefreshOutcome, CoreError> {
        let claims = self
            .signer
            .verify_refresh(refresh_token)
            .map_err(|_| invalid_refresh())?;

        let now = self.clock.now();
        let presented = self
            .tokens
            .find_valid(&sha256_hex(refresh_token.as_bytes()), claims.sub, now)
            .await
            .map_err(lookup_error)?;

        // Re-read the identity so deactivation and role changes take effect.
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(User::can_sign_in)
            .ok_or_else(invalid_refresh)?;

        let tokens = self.signer.issue_pair(user.id, &user.email, user.role)?;
        let replacement = self
            .tokens
            .store(&new_record(&user, &tokens, meta))
            .await?;

        let metadata_recorded = self
            .tokens
            .touch(
                presented.id,
                now,
                meta.ip_address.as_deref(),
                meta.user_agent.as_deref(),
            )
            .await
            .is_ok();

        match self.tokens.revoke(presented.id, now).await {
            Ok(true) => Ok(RefreshOutcome {
                tokens,
                metadata_recorded,
            }),
            Ok(false) => {
                // Another rotation of the same token won.
                let _ = self.tokens.revoke(replacement.id, now).await;
                Err(invalid_refresh())
            }
            Err(err) => {
                let _ = self.tokens.revoke(replacement.id, now).await;
                Err(err.into())
            }
        }
    }

    /// Revoke every refresh record of the access token's owner.
    ///
    /// Always succeeds from the caller's point of view.
    pub async fn logout(&self, access_token: Option<&str>) -> LogoutOutcome {
        let Some(claims) = access_token.and_then(|t| self.signer.verify_access(t).ok()) else {
            return LogoutOutcome::Anonymous;
        };

        match self
            .tokens
            .revoke_all_for_user(claims.sub, self.clock.now())
            .await
        {
            Ok(count) => LogoutOutcome::Revoked(count),
            Err(err) => LogoutOutcome::RevocationFailed(err.to_string()),
        }
    }

    /// Like [`logout`](Self::logout) but reports the count and fails loudly.
    pub async fn logout_all(&self, access_token: &str) -> Result<u64, CoreError> {
        let actor = self.authenticate(access_token)?;
        Ok(self
            .tokens
            .revoke_all_for_user(actor.user_id, self.clock.now())
            .await?)
    }

    /// Revoke exactly the record behind one refresh token.
    pub async fn revoke_session(&self, refresh_token: &str) -> Result<(), CoreError> {
        let claims = self
            .signer
            .verify_refresh(refresh_token)
            .map_err(|_| invalid_refresh())?;

        let now = self.clock.now();
        let record = self
            .tokens
            .find_valid(&sha256_hex(refresh_token.as_bytes()), claims.sub, now)
            .await
            .map_err(lookup_error)?;

        if self.tokens.revoke(record.id, now).await? {
            Ok(())
        } else {
            Err(invalid_refresh())
        }
    }

    /// The caller's usable refresh records, newest first.
    pub async fn list_active_sessions(
        &self,
        access_token: &str,
    ) -> Result<Vec<SessionInfo>, CoreError> {
        let actor = self.authenticate(access_token)?;
        let records = self
            .tokens
            .list_active(actor.user_id, self.clock.now())
            .await?;
        Ok(records.into_iter().map(SessionInfo::from).collect())
    }

    /// Resolve the caller behind an access token.
    pub fn authenticate(&self, access_token: &str) -> Result<Actor, CoreError> {
        let claims = self.signer.verify_access(access_token)?;
        Ok(Actor::new(claims.sub, claims.role))
    }

    async fn issue_and_store(&self, user: &User, meta: &ClientMeta) -> Result<TokenPair, CoreError> {
        let tokens = self.signer.issue_pair(user.id, &user.email, user.role)?;
        self.tokens.store(&new_record(user, &tokens, meta)).await?;
        Ok(tokens)
    }
}

fn new_record(user: &User, tokens: &TokenPair, meta: &ClientMeta) -> CreateRefreshToken {
    CreateRefreshToken {
        user_id: user.id,
        token_hash: sha256_hex(tokens.refresh_token.as_bytes()),
        issued_at: tokens.refresh_issued_at,
        expires_at: tokens.refresh_expires_at,
        ip_address: meta.ip_address.clone(),
        user_agent: meta.user_agent.clone(),
    }
}

fn lookup_error(err: LookupError) -> CoreError {
    match err {
        LookupError::Rejected(_) => invalid_refresh(),
        LookupError::Store(err) => err.into(),
    }
}

fn invalid_credentials() -> CoreError {
    CoreError::Unauthorized(INVALID_CREDENTIALS.into())
}

fn invalid_refresh() -> CoreError {
    CoreError::Unauthorized(INVALID_REFRESH_TOKEN.into())
}
