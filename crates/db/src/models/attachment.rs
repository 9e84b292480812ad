//! Evidence-file metadata model and DTOs.

use laurel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `achievement_attachments` table. The bytes live in the
/// blob store under `blob_key`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attachment {
    pub id: DbId,
    pub achievement_id: DbId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing)]
    pub blob_key: String,
    pub uploaded_by: DbId,
    pub uploaded_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateAttachment {
    pub achievement_id: DbId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub blob_key: String,
    pub uploaded_by: DbId,
}
