//! Evidence files attached to achievements.
//!
//! Bytes go to a [`BlobStore`], metadata to an [`AttachmentStore`]. Files can
//! only be added or removed while the achievement is a draft, by its owner;
//! anyone allowed to read the achievement may list and download them.

use std::sync::Arc;

use laurel_core::achievement::ensure_editable;
use laurel_core::attachment::{content_type_for, UploadPolicy};
use laurel_core::clock::Clock;
use laurel_core::error::CoreError;
use laurel_core::roles::Actor;
use laurel_core::types::DbId;
use laurel_db::models::achievement::Achievement;
use laurel_db::models::attachment::{Attachment, CreateAttachment};
use laurel_db::store::{AchievementStore, AttachmentStore};
use uuid::Uuid;

use crate::blob::{BlobError, BlobStore};
use crate::workflow::{ensure_owner, ensure_readable};

const ENTITY: &str = "Attachment";

/// A file's metadata and content.
#[derive(Debug, Clone)]
pub struct Download {
    pub attachment: Attachment,
    pub bytes: Vec<u8>,
}

/// Result of removing an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// `false` when the metadata is gone but the blob could not be deleted.
    pub blob_removed: bool,
}

pub struct AttachmentService {
    achievements: Arc<dyn AchievementStore>,
    attachments: Arc<dyn AttachmentStore>,
    blobs: Arc<dyn BlobStore>,
    policy: UploadPolicy,
    clock: Arc<dyn Clock>,
}

impl AttachmentService {
    pub fn new(
        achievements: Arc<dyn AchievementStore>,
        attachments: Arc<dyn AttachmentStore>,
        blobs: Arc<dyn BlobStore>,
        policy: UploadPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            achievements,
            attachments,
            blobs,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Attach a file to a draft. The content type is derived from the
    /// extension; whatever the client claimed is ignored.
    ///
    /// The draft check runs again after the metadata insert, so an upload
    /// racing a submit never leaves a file on a submitted record.
    pub async fn upload(
        &self,
        actor: &Actor,
        achievement_id: DbId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Attachment, CoreError> {
        let achievement = self.find_achievement(achievement_id).await?;
        ensure_owner(actor, &achievement)?;
        ensure_editable(achievement.status, "attach files to")?;

        let file_name = sanitize_file_name(file_name);
        let ext = self.policy.check(&file_name, bytes.len() as u64)?;
        let size_bytes = bytes.len() as i64;
        let blob_key = format!("{achievement_id}/{}.{ext}", Uuid::now_v7());

        self.blobs
            .put(&blob_key, bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to store file: {e}")))?;

        let create = CreateAttachment {
            achievement_id,
            file_name,
            content_type: content_type_for(&ext).to_string(),
            size_bytes,
            blob_key: blob_key.clone(),
            uploaded_by: actor.user_id,
        };
        let attachment = match self.attachments.create(&create, self.clock.now()).await {
            Ok(attachment) => attachment,
            Err(err) => {
                let _ = self.blobs.delete(&blob_key).await;
                return Err(err.into());
            }
        };

        // A submit or delete that landed after the first check wins; undo ours.
        let recheck = self
            .find_achievement(achievement_id)
            .await
            .and_then(|a| ensure_editable(a.status, "attach files to"));
        match recheck {
            Ok(()) => Ok(attachment),
            Err(err) => {
                let _ = self.attachments.delete(achievement_id, attachment.id).await;
                let _ = self.blobs.delete(&blob_key).await;
                Err(err)
            }
        }
    }

    pub async fn list(&self, actor: &Actor, achievement_id: DbId) -> Result<Vec<Attachment>, CoreError> {
        let achievement = self.find_achievement(achievement_id).await?;
        ensure_readable(actor, &achievement)?;
        Ok(self.attachments.list(achievement_id).await?)
    }

    pub async fn download(
        &self,
        actor: &Actor,
        achievement_id: DbId,
        attachment_id: DbId,
    ) -> Result<Download, CoreError> {
        let achievement = self.find_achievement(achievement_id).await?;
        ensure_readable(actor, &achievement)?;
        let attachment = self.find_attachment(achievement_id, attachment_id).await?;

        let bytes = self
            .blobs
            .get(&attachment.blob_key)
            .await
            .map_err(|e| match e {
                BlobError::NotFound(_) => CoreError::not_found(ENTITY, attachment_id),
                other => CoreError::Internal(format!("Failed to read file: {other}")),
            })?;
        Ok(Download { attachment, bytes })
    }

    /// Remove a file from a draft. Metadata goes first; blob removal is
    /// best-effort.
    pub async fn delete(
        &self,
        actor: &Actor,
        achievement_id: DbId,
        attachment_id: DbId,
    ) -> Result<Removal, CoreError> {
        let achievement = self.find_achievement(achievement_id).await?;
        ensure_owner(actor, &achievement)?;
        ensure_editable(achievement.status, "remove files from")?;
        let attachment = self.find_attachment(achievement_id, attachment_id).await?;

        if !self.attachments.delete(achievement_id, attachment_id).await? {
            return Err(CoreError::not_found(ENTITY, attachment_id));
        }
        let blob_removed = self.blobs.delete(&attachment.blob_key).await.is_ok();
        Ok(Removal { blob_removed })
    }

    async fn find_achievement(&self, id: DbId) -> Result<Achievement, CoreError> {
        self.achievements
            .find(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Achievement", id))
    }

    async fn find_attachment(&self, achievement_id: DbId, id: DbId) -> Result<Attachment, CoreError> {
        self.attachments
            .find(achievement_id, id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, id))
    }
}

/// Keep only the final path segment of a client-supplied name.
fn sanitize_file_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
