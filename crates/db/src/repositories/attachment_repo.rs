//! Repository for the `achievement_attachments` table.

use laurel_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::attachment::{Attachment, CreateAttachment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, achievement_id, file_name, content_type, size_bytes, blob_key, uploaded_by, uploaded_at";

/// Provides metadata persistence for evidence files.
pub struct AttachmentRepo;

impl AttachmentRepo {
    /// Insert attachment metadata, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAttachment,
        now: Timestamp,
    ) -> Result<Attachment, sqlx::Error> {
        let query = format!(
            "INSERT INTO achievement_attachments
                (achievement_id, file_name, content_type, size_bytes, blob_key, uploaded_by, uploaded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(input.achievement_id)
            .bind(&input.file_name)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(&input.blob_key)
            .bind(input.uploaded_by)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// List the files attached to an achievement, in upload order.
    pub async fn list_for_achievement(
        pool: &PgPool,
        achievement_id: DbId,
    ) -> Result<Vec<Attachment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM achievement_attachments
             WHERE achievement_id = $1
             ORDER BY uploaded_at ASC, id ASC"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(achievement_id)
            .fetch_all(pool)
            .await
    }

    /// Find one attachment, scoped to its achievement.
    pub async fn find(
        pool: &PgPool,
        achievement_id: DbId,
        id: DbId,
    ) -> Result<Option<Attachment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM achievement_attachments WHERE id = $1 AND achievement_id = $2"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .bind(achievement_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete attachment metadata. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, achievement_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM achievement_attachments WHERE id = $1 AND achievement_id = $2",
        )
        .bind(id)
        .bind(achievement_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
