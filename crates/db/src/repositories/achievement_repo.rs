//! Repository for the `achievements` table.
//!
//! Every write is conditioned on `is_deleted = false` and, where the status
//! machine applies, on the expected pre-state. A `None` result means the
//! guard did not match.

use laurel_core::achievement::{AchievementStatus, STATUS_DRAFT, STATUS_SUBMITTED};
use laurel_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::achievement::{Achievement, CreateAchievement, UpdateAchievement};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, title, description, category, achievement_date, status, \
                        submitted_at, verified_by, verified_at, rejection_reason, is_deleted, \
                        created_at, updated_at";

/// Provides CRUD and guarded status updates for achievements.
pub struct AchievementRepo;

impl AchievementRepo {
    /// Insert a new draft, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAchievement,
        now: Timestamp,
    ) -> Result<Achievement, sqlx::Error> {
        let query = format!(
            "INSERT INTO achievements
                (owner_id, title, description, category, achievement_date, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, '{STATUS_DRAFT}', $6, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(input.owner_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.achievement_date)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a non-deleted achievement by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Achievement>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM achievements WHERE id = $1 AND is_deleted = false");
        sqlx::query_as::<_, Achievement>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's non-deleted achievements, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<Achievement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM achievements
             WHERE owner_id = $1 AND is_deleted = false
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// List every non-deleted achievement, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Achievement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM achievements
             WHERE is_deleted = false
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .fetch_all(pool)
            .await
    }

    /// List non-deleted achievements in `status`, oldest submission first.
    pub async fn list_by_status(
        pool: &PgPool,
        status: AchievementStatus,
    ) -> Result<Vec<Achievement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM achievements
             WHERE status = $1 AND is_deleted = false
             ORDER BY submitted_at ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
    }

    /// Apply a patch to a draft. Only non-`None` fields in `input` are applied.
    pub async fn update_draft(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAchievement,
        now: Timestamp,
    ) -> Result<Option<Achievement>, sqlx::Error> {
        let query = format!(
            "UPDATE achievements SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                achievement_date = COALESCE($5, achievement_date),
                updated_at = $6
             WHERE id = $1 AND status = '{STATUS_DRAFT}' AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.achievement_date)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// `draft -> submitted`.
    pub async fn submit(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Achievement>, sqlx::Error> {
        let query = format!(
            "UPDATE achievements SET status = '{STATUS_SUBMITTED}', submitted_at = $2, updated_at = $2
             WHERE id = $1 AND status = '{STATUS_DRAFT}' AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// `submitted -> verified`, stamping the reviewer.
    pub async fn verify(
        pool: &PgPool,
        id: DbId,
        verifier_id: DbId,
        now: Timestamp,
    ) -> Result<Option<Achievement>, sqlx::Error> {
        let verified = AchievementStatus::Verified.as_str();
        let query = format!(
            "UPDATE achievements SET
                status = '{verified}', verified_by = $2, verified_at = $3, updated_at = $3
             WHERE id = $1 AND status = '{STATUS_SUBMITTED}' AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(id)
            .bind(verifier_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// `submitted -> rejected`, stamping the reviewer and reason.
    pub async fn reject(
        pool: &PgPool,
        id: DbId,
        verifier_id: DbId,
        reason: &str,
        now: Timestamp,
    ) -> Result<Option<Achievement>, sqlx::Error> {
        let rejected = AchievementStatus::Rejected.as_str();
        let query = format!(
            "UPDATE achievements SET
                status = '{rejected}', verified_by = $2, verified_at = $3,
                rejection_reason = $4, updated_at = $3
             WHERE id = $1 AND status = '{STATUS_SUBMITTED}' AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(id)
            .bind(verifier_id)
            .bind(now)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a draft. Returns `true` if the row was updated.
    pub async fn soft_delete_draft(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE achievements SET is_deleted = true, updated_at = $2
             WHERE id = $1 AND status = '{STATUS_DRAFT}' AND is_deleted = false"
        );
        let result = sqlx::query(&query).bind(id).bind(now).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
