//! In-process store adapters.
//!
//! Each store keeps its rows behind a `tokio::sync::Mutex` and applies the
//! same guards as the SQL in [`crate::repositories`]: a conditional write
//! inspects and mutates the row under one lock acquisition, so concurrent
//! callers observe compare-and-swap semantics.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use laurel_core::achievement::AchievementStatus;
use laurel_core::roles::Role;
use laurel_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::achievement::{Achievement, CreateAchievement, StatusChange, UpdateAchievement};
use crate::models::attachment::{Attachment, CreateAttachment};
use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};
use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};
use crate::store::{AchievementStore, AttachmentStore, RefreshTokenStore, UserStore};

/// Rows keyed by id plus the next id to hand out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<DbId, T>,
    next_id: DbId,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> DbId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: Mutex<Table<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Case-insensitive email equality, as `LOWER(email)` compares in SQL.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, input: &CreateUser, now: Timestamp) -> Result<User, StoreError> {
        let mut table = self.table.lock().await;
        let taken = table
            .rows
            .values()
            .any(|u| same_email(&u.email, &input.email));
        if taken {
            return Err(StoreError::Duplicate("uq_users_email".into()));
        }

        let id = table.allocate();
        let user = User {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            student_number: input.student_number.clone(),
            advisor_id: None,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .find(|u| !u.is_deleted && same_email(&u.email, email))
            .cloned())
    }

    async fn set_advisor(
        &self,
        student_id: DbId,
        advisor_id: DbId,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        let mut table = self.table.lock().await;
        let Some(student) = table.rows.get_mut(&student_id) else {
            return Ok(None);
        };
        if student.is_deleted || student.role != Role::Student {
            return Ok(None);
        }
        student.advisor_id = Some(advisor_id);
        student.updated_at = now;
        Ok(Some(student.clone()))
    }

    async fn list_advisees(&self, advisor_id: DbId) -> Result<Vec<User>, StoreError> {
        let table = self.table.lock().await;
        let mut advisees: Vec<User> = table
            .rows
            .values()
            .filter(|u| !u.is_deleted && u.advisor_id == Some(advisor_id))
            .cloned()
            .collect();
        advisees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(advisees)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateUser,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        let mut table = self.table.lock().await;
        if let Some(email) = &input.email {
            let taken = table
                .rows
                .values()
                .any(|u| u.id != id && same_email(&u.email, email));
            if taken {
                return Err(StoreError::Duplicate("uq_users_email".into()));
            }
        }

        let Some(user) = table.rows.get_mut(&id).filter(|u| !u.is_deleted) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            user.name = name.clone();
        }
        if let Some(email) = &input.email {
            user.email = email.clone();
        }
        if let Some(hash) = &input.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(number) = &input.student_number {
            user.student_number = Some(number.clone());
        }
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn set_active(
        &self,
        id: DbId,
        active: bool,
        now: Timestamp,
    ) -> Result<Option<User>, StoreError> {
        let mut table = self.table.lock().await;
        let Some(user) = table.rows.get_mut(&id).filter(|u| !u.is_deleted) else {
            return Ok(None);
        };
        user.is_active = active;
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: DbId, now: Timestamp) -> Result<bool, StoreError> {
        let mut table = self.table.lock().await;
        match table.rows.get_mut(&id).filter(|u| !u.is_deleted) {
            Some(user) => {
                user.is_deleted = true;
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let table = self.table.lock().await;
        let mut users: Vec<User> = table
            .rows
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

// ---------------------------------------------------------------------------
// Refresh tokens
// ---------------------------------------------------------------------------

/// Refresh-token records with switchable failure injection.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    table: Mutex<Table<RefreshToken>>,
    unavailable: AtomicBool,
    touch_fails: AtomicBool,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every operation fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// When set, only [`RefreshTokenStore::touch`] fails.
    pub fn set_touch_fails(&self, fails: bool) {
        self.touch_fails.store(fails, Ordering::SeqCst);
    }

    /// Snapshot of every stored record, in id order.
    pub async fn records(&self) -> Vec<RefreshToken> {
        self.table.lock().await.rows.values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("refresh token store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn store(&self, input: &CreateRefreshToken) -> Result<RefreshToken, StoreError> {
        self.check_available()?;
        let mut table = self.table.lock().await;
        if table.rows.values().any(|r| r.token_hash == input.token_hash) {
            return Err(StoreError::Duplicate("uq_refresh_tokens_token_hash".into()));
        }

        let id = table.allocate();
        let record = RefreshToken {
            id,
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            issued_at: input.issued_at,
            expires_at: input.expires_at,
            is_revoked: false,
            revoked_at: None,
            last_used_at: None,
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
        };
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
        user_id: DbId,
    ) -> Result<Option<RefreshToken>, StoreError> {
        self.check_available()?;
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .find(|r| r.token_hash == token_hash && r.user_id == user_id)
            .cloned())
    }

    async fn revoke(&self, id: DbId, at: Timestamp) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut table = self.table.lock().await;
        match table.rows.get_mut(&id) {
            Some(record) if !record.is_revoked => {
                record.is_revoked = true;
                record.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: DbId, at: Timestamp) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut table = self.table.lock().await;
        let mut count = 0;
        for record in table
            .rows
            .values_mut()
            .filter(|r| r.user_id == user_id && !r.is_revoked)
        {
            record.is_revoked = true;
            record.revoked_at = Some(at);
            count += 1;
        }
        Ok(count)
    }

    async fn touch(
        &self,
        id: DbId,
        at: Timestamp,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        if self.touch_fails.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("touch rejected".into()));
        }
        let mut table = self.table.lock().await;
        if let Some(record) = table.rows.get_mut(&id) {
            record.last_used_at = Some(at);
            if let Some(ip) = ip_address {
                record.ip_address = Some(ip.to_string());
            }
            if let Some(ua) = user_agent {
                record.user_agent = Some(ua.to_string());
            }
        }
        Ok(())
    }

    async fn list_active(
        &self,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<RefreshToken>, StoreError> {
        self.check_available()?;
        let table = self.table.lock().await;
        let mut active: Vec<RefreshToken> = table
            .rows
            .values()
            .filter(|r| r.user_id == user_id && r.check_usable(now).is_ok())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }

    async fn sweep(&self, now: Timestamp) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table.rows.retain(|_, r| r.expires_at > now);
        Ok((before - table.rows.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryAchievementStore {
    table: Mutex<Table<Achievement>>,
}

impl MemoryAchievementStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(rows: &mut [Achievement]) {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    }
}

#[async_trait]
impl AchievementStore for MemoryAchievementStore {
    async fn create(
        &self,
        input: &CreateAchievement,
        now: Timestamp,
    ) -> Result<Achievement, StoreError> {
        let mut table = self.table.lock().await;
        let id = table.allocate();
        let achievement = Achievement {
            id,
            owner_id: input.owner_id,
            title: input.title.clone(),
            description: input.description.clone(),
            category: input.category.clone(),
            achievement_date: input.achievement_date,
            status: AchievementStatus::Draft,
            submitted_at: None,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, achievement.clone());
        Ok(achievement)
    }

    async fn find(&self, id: DbId) -> Result<Option<Achievement>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.rows.get(&id).filter(|a| !a.is_deleted).cloned())
    }

    async fn list_by_owner(&self, owner_id: DbId) -> Result<Vec<Achievement>, StoreError> {
        let table = self.table.lock().await;
        let mut rows: Vec<Achievement> = table
            .rows
            .values()
            .filter(|a| !a.is_deleted && a.owner_id == owner_id)
            .cloned()
            .collect();
        Self::newest_first(&mut rows);
        Ok(rows)
    }

    async fn list_all(&self) -> Result<Vec<Achievement>, StoreError> {
        let table = self.table.lock().await;
        let mut rows: Vec<Achievement> =
            table.rows.values().filter(|a| !a.is_deleted).cloned().collect();
        Self::newest_first(&mut rows);
        Ok(rows)
    }

    async fn list_by_status(
        &self,
        status: AchievementStatus,
    ) -> Result<Vec<Achievement>, StoreError> {
        let table = self.table.lock().await;
        let mut rows: Vec<Achievement> = table
            .rows
            .values()
            .filter(|a| !a.is_deleted && a.status == status)
            .cloned()
            .collect();
        rows.sort_by(|a, b| match (a.submitted_at, b.submitted_at) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(rows)
    }

    async fn update_draft(
        &self,
        id: DbId,
        patch: &UpdateAchievement,
        now: Timestamp,
    ) -> Result<Option<Achievement>, StoreError> {
        let mut table = self.table.lock().await;
        let Some(row) = table
            .rows
            .get_mut(&id)
            .filter(|a| !a.is_deleted && a.status == AchievementStatus::Draft)
        else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(description) = &patch.description {
            row.description = description.clone();
        }
        if let Some(category) = &patch.category {
            row.category = category.clone();
        }
        if let Some(date) = patch.achievement_date {
            row.achievement_date = date;
        }
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn transition(
        &self,
        id: DbId,
        change: &StatusChange,
        now: Timestamp,
    ) -> Result<Option<Achievement>, StoreError> {
        let mut table = self.table.lock().await;
        let Some(row) = table
            .rows
            .get_mut(&id)
            .filter(|a| !a.is_deleted && a.status == change.from_status())
        else {
            return Ok(None);
        };
        row.status = change.to_status();
        row.updated_at = now;
        match change {
            StatusChange::Submit => row.submitted_at = Some(now),
            StatusChange::Verify { verifier_id } => {
                row.verified_by = Some(*verifier_id);
                row.verified_at = Some(now);
            }
            StatusChange::Reject {
                verifier_id,
                reason,
            } => {
                row.verified_by = Some(*verifier_id);
                row.verified_at = Some(now);
                row.rejection_reason = Some(reason.clone());
            }
        }
        Ok(Some(row.clone()))
    }

    async fn soft_delete_draft(&self, id: DbId, now: Timestamp) -> Result<bool, StoreError> {
        let mut table = self.table.lock().await;
        match table
            .rows
            .get_mut(&id)
            .filter(|a| !a.is_deleted && a.status == AchievementStatus::Draft)
        {
            Some(row) => {
                row.is_deleted = true;
                row.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryAttachmentStore {
    table: Mutex<Table<Attachment>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn create(
        &self,
        input: &CreateAttachment,
        now: Timestamp,
    ) -> Result<Attachment, StoreError> {
        let mut table = self.table.lock().await;
        if table.rows.values().any(|a| a.blob_key == input.blob_key) {
            return Err(StoreError::Duplicate(
                "uq_achievement_attachments_blob_key".into(),
            ));
        }
        let id = table.allocate();
        let attachment = Attachment {
            id,
            achievement_id: input.achievement_id,
            file_name: input.file_name.clone(),
            content_type: input.content_type.clone(),
            size_bytes: input.size_bytes,
            blob_key: input.blob_key.clone(),
            uploaded_by: input.uploaded_by,
            uploaded_at: now,
        };
        table.rows.insert(id, attachment.clone());
        Ok(attachment)
    }

    async fn list(&self, achievement_id: DbId) -> Result<Vec<Attachment>, StoreError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .filter(|a| a.achievement_id == achievement_id)
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        achievement_id: DbId,
        id: DbId,
    ) -> Result<Option<Attachment>, StoreError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .get(&id)
            .filter(|a| a.achievement_id == achievement_id)
            .cloned())
    }

    async fn delete(&self, achievement_id: DbId, id: DbId) -> Result<bool, StoreError> {
        let mut table = self.table.lock().await;
        let matches = table
            .rows
            .get(&id)
            .is_some_and(|a| a.achievement_id == achievement_id);
        if matches {
            table.rows.remove(&id);
        }
        Ok(matches)
    }
}
