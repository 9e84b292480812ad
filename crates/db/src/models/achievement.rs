//! Achievement entity model and DTOs.

use chrono::NaiveDate;
use laurel_core::achievement::AchievementStatus;
use laurel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `achievements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Achievement {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub achievement_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: AchievementStatus,
    pub submitted_at: Option<Timestamp>,
    /// Reviewer who verified or rejected the record.
    pub verified_by: Option<DbId>,
    pub verified_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new achievement. New records always start as `draft`.
#[derive(Debug, Clone)]
pub struct CreateAchievement {
    pub owner_id: DbId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub achievement_date: NaiveDate,
}

/// DTO for editing a draft. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAchievement {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub achievement_date: Option<NaiveDate>,
}

impl UpdateAchievement {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.achievement_date.is_none()
    }
}

/// A guarded status change. Applied only when the stored status equals
/// [`StatusChange::from_status`] and the row is not deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Submit,
    Verify { verifier_id: DbId },
    Reject { verifier_id: DbId, reason: String },
}

impl StatusChange {
    pub fn from_status(&self) -> AchievementStatus {
        match self {
            Self::Submit => AchievementStatus::Draft,
            Self::Verify { .. } | Self::Reject { .. } => AchievementStatus::Submitted,
        }
    }

    pub fn to_status(&self) -> AchievementStatus {
        match self {
            Self::Submit => AchievementStatus::Submitted,
            Self::Verify { .. } => AchievementStatus::Verified,
            Self::Reject { .. } => AchievementStatus::Rejected,
        }
    }
}
