//! PostgreSQL adapters for the store traits.

use async_trait::async_trait;
use laurel_core::achievement::AchievementStatus;
use laurel_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::achievement::{Achievement, CreateAchievement, StatusChange, UpdateAchievement};
use crate::models::attachment::{Attachment, CreateAttachment};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};
use crate::repositories::{AchievementRepo, AttachmentRepo, RefreshTokenRepo, UserRepo};
use crate::store::{AchievementStore, AttachmentStore, RefreshTokenStore, UserStore};
use crate::DbPool;

/// All four stores over one shared pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, input: &CreateUser, now: Timestamp) -> Result<User, StoreError> {
        Ok(UserRepo::create(&self.pool, input, now).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn set_advisor(
        &self,
        student_id: DbId,
        advisor_id: DbId,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::set_advisor(&self.pool, student_id, advisor_id, now).await?)
    }

    async fn list_advisees(&self, advisor_id: DbId) -> Result<Vec<User>, StoreError> {
        Ok(UserRepo::list_advisees(&self.pool, advisor_id).await?)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateUser,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::update(&self.pool, id, input, now).await?)
    }

    async fn set_active(
        &self,
        id: DbId,
        active: bool,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::set_active(&self.pool, id, active, now).await?)
    }

    async fn soft_delete(&self, id: DbId, now: Timestamp) -> Result<bool, StoreError> {
        Ok(UserRepo::soft_delete(&self.pool, id, now).await?)
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        Ok(UserRepo::list(&self.pool, filter).await?)
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn store(&self, input: &CreateRefreshToken) -> Result<RefreshToken, StoreError> {
        Ok(RefreshTokenRepo::create(&self.pool, input).await?)
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
        user_id: DbId,
    ) -> Result<Option<RefreshToken>, StoreError> {
        Ok(RefreshTokenRepo::find_by_hash_for_user(&self.pool, token_hash, user_id).await?)
    }

    async fn revoke(&self, id: DbId, at: Timestamp) -> Result<bool, StoreError> {
        Ok(RefreshTokenRepo::revoke(&self.pool, id, at).await?)
    }

    async fn revoke_all_for_user(&self, user_id: DbId, at: Timestamp) -> Result<u64, StoreError> {
        Ok(RefreshTokenRepo::revoke_all_for_user(&self.pool, user_id, at).await?)
    }

    async fn touch(
        &self,
        id: DbId,
        at: Timestamp,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), StoreError> {
        Ok(RefreshTokenRepo::touch(&self.pool, id, at, ip_address, user_agent).await?)
    }

    async fn list_active(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<RefreshToken>, StoreError> {
        Ok(RefreshTokenRepo::list_active_for_user(&self.pool, user_id, now).await?)
    }

    async fn sweep(&self, now: Timestamp) -> Result<u64, StoreError> {
        Ok(RefreshTokenRepo::delete_expired(&self.pool, now).await?)
    }
}

#[async_trait]
impl AchievementStore for PgStore {
    async fn create(
        &self,
        input: &CreateAchievement,
        now: Timestamp,
    ) -> Result<Achievement, StoreError> {
        Ok(AchievementRepo::create(&self.pool, input, now).await?)
    }

    async fn find(&self, id: DbId) -> Result<Option<Achievement>, StoreError> {
        Ok(AchievementRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Achievement>, StoreError> {
        Ok(AchievementRepo::list_by_owner(&self.pool, owner_id).await?)
    }

    async fn list_all(&self) -> Result<Vec<Achievement>, StoreError> {
        Ok(AchievementRepo::list_all(&self.pool).await?)
    }

    async fn list_by_status(
        &self,
        status: AchievementStatus,
    ) -> Result<Vec<Achievement>, StoreError> {
        Ok(AchievementRepo::list_by_status(&self.pool, status).await?)
    }

    async fn update_draft(
        &self,
        id: DbId,
        patch: &UpdateAchievement,
        now: Timestamp,
    ) -> Result<Option<Achievement>, StoreError> {
        Ok(AchievementRepo::update_draft(&self.pool, id, patch, now).await?)
    }

    async fn transition(
        &self,
        id: DbId,
        change: &StatusChange,
        now: Timestamp,
    ) -> Result<Option<Achievement>, StoreError> {
        let updated = match change {
            StatusChange::Submit => AchievementRepo::submit(&self.pool, id, now).await?,
            StatusChange::Verify { verifier_id } => {
                AchievementRepo::verify(&self.pool, id, *verifier_id, now).await?
            }
            StatusChange::Reject {
                verifier_id,
                reason,
            } => AchievementRepo::reject(&self.pool, id, *verifier_id, reason, now).await?,
        };
        Ok(updated)
    }

    async fn soft_delete_draft(&self, id: DbId, now: Timestamp) -> Result<bool, StoreError> {
        Ok(AchievementRepo::soft_delete_draft(&self.pool, id, now).await?)
    }
}

#[async_trait]
impl AttachmentStore for PgStore {
    async fn create(
        &self,
        input: &CreateAttachment,
        now: Timestamp,
    ) -> Result<Attachment, StoreError> {
        Ok(AttachmentRepo::create(&self.pool, input, now).await?)
    }

    async fn list(&self, achievement_id: DbId) -> Result<Vec<Attachment>, StoreError> {
        Ok(AttachmentRepo::list_for_achievement(&self.pool, achievement_id).await?)
    }

    async fn find(
        &self,
        achievement_id: DbId,
        id: DbId,
    ) -> Result<Option<Attachment>, StoreError> {
        Ok(AttachmentRepo::find(&self.pool, achievement_id, id).await?)
    }

    async fn delete(&self, achievement_id: DbId, id: DbId) -> Result<bool, StoreError> {
        Ok(AttachmentRepo::delete(&self.pool, achievement_id, id).await?)
    }
}
