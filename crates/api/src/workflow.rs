//! Achievement status machine with ownership and role gates.
//!
//! Every operation resolves in the same order: find the non-deleted record
//! (`NotFound`), check who is asking (`Forbidden`), check the current status
//! (`InvalidState`), then issue a write guarded on the expected pre-state. A
//! guard that no longer matches (a concurrent caller got there first) is
//! reported as `InvalidState`.

use std::sync::Arc;

use chrono::NaiveDate;
use laurel_core::achievement::{
    ensure_editable, validate_category, validate_description, validate_fields,
    validate_rejection_reason, validate_title, validate_transition, AchievementStatus,
};
use laurel_core::clock::Clock;
use laurel_core::error::CoreError;
use laurel_core::roles::{Actor, Role};
use laurel_core::types::DbId;
use laurel_db::models::achievement::{
    Achievement, CreateAchievement, StatusChange, UpdateAchievement,
};
use laurel_db::store::AchievementStore;
use serde::Deserialize;

const ENTITY: &str = "Achievement";

/// Fields of a new achievement as submitted by its owner.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAchievement {
    pub title: String,
    pub description: String,
    pub category: String,
    pub achievement_date: NaiveDate,
}

pub struct AchievementWorkflow {
    store: Arc<dyn AchievementStore>,
    clock: Arc<dyn Clock>,
}

impl AchievementWorkflow {
    pub fn new(store: Arc<dyn AchievementStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a draft owned by the calling student.
    pub async fn create(&self, actor: &Actor, input: NewAchievement) -> Result<Achievement, CoreError> {
        match actor.role {
            Role::Student => {}
            Role::Advisor | Role::Admin => {
                return Err(CoreError::Forbidden(
                    "Only students can create achievements".into(),
                ))
            }
        }
        validate_fields(&input.title, &input.description, &input.category)?;

        let create = CreateAchievement {
            owner_id: actor.user_id,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            category: input.category.trim().to_string(),
            achievement_date: input.achievement_date,
        };
        Ok(self.store.create(&create, self.clock.now()).await?)
    }

    /// Read one record. Students may only read their own.
    pub async fn get(&self, actor: &Actor, id: DbId) -> Result<Achievement, CoreError> {
        let achievement = self.find(id).await?;
        ensure_readable(actor, &achievement)?;
        Ok(achievement)
    }

    /// Students see their own records; reviewers see everything.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Achievement>, CoreError> {
        let rows = if actor.role.sees_all_achievements() {
            self.store.list_all().await?
        } else {
            self.store.list_by_owner(actor.user_id).await?
        };
        Ok(rows)
    }

    /// Submitted records awaiting review. Reviewers only.
    pub async fn list_pending(&self, actor: &Actor) -> Result<Vec<Achievement>, CoreError> {
        actor.require_reviewer()?;
        Ok(self
            .store
            .list_by_status(AchievementStatus::Submitted)
            .await?)
    }

    /// Patch a draft. Owner only.
    pub async fn update(
        &self,
        actor: &Actor,
        id: DbId,
        patch: UpdateAchievement,
    ) -> Result<Achievement, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::Validation("No fields to update".into()));
        }
        let patch = normalise_patch(patch)?;

        let current = self.find_owned(actor, id).await?;
        ensure_editable(current.status, "update")?;

        self.store
            .update_draft(id, &patch, self.clock.now())
            .await?
            .ok_or_else(|| stale(id))
    }

    /// Soft-delete a draft. Owner only.
    pub async fn delete(&self, actor: &Actor, id: DbId) -> Result<(), CoreError> {
        let current = self.find_owned(actor, id).await?;
        ensure_editable(current.status, "delete")?;

        if self.store.soft_delete_draft(id, self.clock.now()).await? {
            Ok(())
        } else {
            Err(stale(id))
        }
    }

    /// `draft -> submitted`. Owner only.
    pub async fn submit(&self, actor: &Actor, id: DbId) -> Result<Achievement, CoreError> {
        let current = self.find_owned(actor, id).await?;
        self.apply(current, StatusChange::Submit).await
    }

    /// `submitted -> verified`. Advisors and admins only.
    pub async fn verify(&self, actor: &Actor, id: DbId) -> Result<Achievement, CoreError> {
        actor.require_reviewer()?;
        let current = self.find(id).await?;
        self.apply(
            current,
            StatusChange::Verify {
                verifier_id: actor.user_id,
            },
        )
        .await
    }

    /// `submitted -> rejected` with a mandatory reason. Advisors and admins only.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: DbId,
        reason: &str,
    ) -> Result<Achievement, CoreError> {
        actor.require_reviewer()?;
        validate_rejection_reason(reason)?;
        let current = self.find(id).await?;
        self.apply(
            current,
            StatusChange::Reject {
                verifier_id: actor.user_id,
                reason: reason.trim().to_string(),
            },
        )
        .await
    }

    async fn apply(
        &self,
        current: Achievement,
        change: StatusChange,
    ) -> Result<Achievement, CoreError> {
        validate_transition(current.status, change.to_status())?;
        self.store
            .transition(current.id, &change, self.clock.now())
            .await?
            .ok_or_else(|| stale(current.id))
    }

    async fn find(&self, id: DbId) -> Result<Achievement, CoreError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, id))
    }

    async fn find_owned(&self, actor: &Actor, id: DbId) -> Result<Achievement, CoreError> {
        let achievement = self.find(id).await?;
        ensure_owner(actor, &achievement)?;
        Ok(achievement)
    }
}

/// Fail with `Forbidden` unless `actor` owns the record.
pub fn ensure_owner(actor: &Actor, achievement: &Achievement) -> Result<(), CoreError> {
    if achievement.owner_id == actor.user_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the owning student may modify this achievement".into(),
        ))
    }
}

/// Fail with `Forbidden` unless `actor` may see the record.
pub fn ensure_readable(actor: &Actor, achievement: &Achievement) -> Result<(), CoreError> {
    match actor.role {
        Role::Advisor | Role::Admin => Ok(()),
        Role::Student if achievement.owner_id == actor.user_id => Ok(()),
        Role::Student => Err(CoreError::Forbidden(
            "Students may only view their own achievements".into(),
        )),
    }
}

fn normalise_patch(patch: UpdateAchievement) -> Result<UpdateAchievement, CoreError> {
    if let Some(title) = &patch.title {
        validate_title(title)?;
    }
    if let Some(description) = &patch.description {
        validate_description(description)?;
    }
    if let Some(category) = &patch.category {
        validate_category(category)?;
    }
    Ok(UpdateAchievement {
        title: patch.title.map(|s| s.trim().to_string()),
        description: patch.description.map(|s| s.trim().to_string()),
        category: patch.category.map(|s| s.trim().to_string()),
        achievement_date: patch.achievement_date,
    })
}

/// The guarded write matched no row: the record moved on underneath us.
fn stale(id: DbId) -> CoreError {
    CoreError::InvalidState(format!(
        "Achievement {id} changed state concurrently; reload and retry"
    ))
}
