//! Collaborator boundaries consumed by the session, workflow, account, and
//! attachment services.
//!
//! Implementations must honour the conditional-update contracts documented
//! on each method; the services rely on them for race safety instead of
//! in-process locking.

use async_trait::async_trait;
use laurel_core::achievement::AchievementStatus;
use laurel_core::refresh::RefreshRejection;
use laurel_core::types::{DbId, Timestamp};

use crate::error::{LookupError, StoreError};
use crate::models::achievement::{Achievement, CreateAchievement, StatusChange, UpdateAchievement};
use crate::models::attachment::{Attachment, CreateAttachment};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};

/// Credential and account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, input: &CreateUser, now: Timestamp) -> Result<User, StoreError>;

    /// Includes soft-deleted rows; callers check [`User::can_sign_in`].
    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    /// Non-deleted rows only, email compared case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// `None` unless the target is a non-deleted student.
    async fn set_advisor(
        &self,
        student_id: DbId,
        advisor_id: DbId,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError>;

    async fn list_advisees(&self, advisor_id: DbId) -> Result<Vec<User>, StoreError>;

    /// `None` unless the row exists and is not deleted. A changed email that
    /// collides case-insensitively is a [`StoreError::Duplicate`].
    async fn update(
        &self,
        id: DbId,
        input: &UpdateUser,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError>;

    /// `None` unless the row exists and is not deleted.
    async fn set_active(
        &self,
        id: DbId,
        active: bool,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError>;

    /// `true` only for the call that flipped `is_deleted`.
    async fn soft_delete(&self, id: DbId, now: Timestamp) -> Result<bool, StoreError>;

    /// Non-deleted rows matching `filter`, ordered by name then id.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;
}

/// Refresh-token record persistence.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Append a record; never overwrites.
    async fn store(&self, input: &CreateRefreshToken) -> Result<RefreshToken, StoreError>;

    /// Raw lookup by hash and owner, regardless of usability.
    async fn find_by_hash(
        &self,
        token_hash: &str,
        user_id: DbId,
    ) -> Result<Option<RefreshToken>, StoreError>;

    /// Compare-and-swap revoke: `true` only for the call that flipped the row.
    async fn revoke(&self, id: DbId, at: Timestamp) -> Result<bool, StoreError>;

    async fn revoke_all_for_user(&self, user_id: DbId, at: Timestamp) -> Result<u64, StoreError>;

    async fn touch(
        &self,
        id: DbId,
        at: Timestamp,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn list_active(&self, user_id: DbId, now: Timestamp)
        -> Result<Vec<RefreshToken>, StoreError>;

    /// Delete records with `expires_at <= now`.
    async fn sweep(&self, now: Timestamp) -> Result<u64, StoreError>;

    /// Look up a record that must be usable at `now`.
    async fn find_valid(
        &self,
        token_hash: &str,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<RefreshToken, LookupError> {
        let record = self
            .find_by_hash(token_hash, user_id)
            .await?
            .ok_or(RefreshRejection::NotFound)?;
        record.check_usable(now)?;
        Ok(record)
    }
}

/// Achievement persistence with guarded writes.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    async fn create(
        &self,
        input: &CreateAchievement,
        now: Timestamp,
    ) -> Result<Achievement, StoreError>;

    /// Non-deleted rows only.
    async fn find(&self, id: DbId) -> Result<Option<Achievement>, StoreError>;

    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Achievement>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Achievement>, StoreError>;

    async fn list_by_status(
        &self,
        status: AchievementStatus,
    ) -> Result<Vec<Achievement>, StoreError>;

    /// `None` unless the row is a non-deleted draft.
    async fn update_draft(
        &self,
        id: DbId,
        patch: &UpdateAchievement,
        now: Timestamp,
    ) -> Result<Option<Achievement>, StoreError>;

    /// `None` unless the row is non-deleted and in [`StatusChange::from_status`].
    async fn transition(
        &self,
        id: DbId,
        change: &StatusChange,
        now: Timestamp,
    ) -> Result<Option<Achievement>, StoreError>;

    /// `false` unless the row was a non-deleted draft.
    async fn soft_delete_draft(&self, id: DbId, now: Timestamp) -> Result<bool, StoreError>;
}

/// Evidence-file metadata persistence.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn create(&self, input: &CreateAttachment, now: Timestamp)
        -> Result<Attachment, StoreError>;

    async fn list(&self, achievement_id: DbId) -> Result<Vec<Attachment>, StoreError>;

    async fn find(&self, achievement_id: DbId, id: DbId)
        -> Result<Option<Attachment>, StoreError>;

    async fn delete(&self, achievement_id: DbId, id: DbId) -> Result<bool, StoreError>;
}
