//! Achievement status machine and field validation.
//!
//! Transition rules:
//! - `draft`     -> `submitted`
//! - `submitted` -> `verified`, `rejected`
//! - `verified`, `rejected` are terminal
//!
//! Only `draft` records may be edited, soft-deleted, or have evidence files
//! attached or removed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_SUBMITTED: &str = "submitted";
pub const STATUS_VERIFIED: &str = "verified";
pub const STATUS_REJECTED: &str = "rejected";

/// Maximum length for the title field (characters).
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length for the category field (characters).
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// Maximum length for a rejection reason (characters).
pub const MAX_REASON_LENGTH: usize = 2_000;

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementStatus {
    Draft,
    Submitted,
    Verified,
    Rejected,
}

impl AchievementStatus {
    pub const ALL: [AchievementStatus; 4] = [
        Self::Draft,
        Self::Submitted,
        Self::Verified,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Submitted => STATUS_SUBMITTED,
            Self::Verified => STATUS_VERIFIED,
            Self::Rejected => STATUS_REJECTED,
        }
    }

    pub fn is_terminal(self) -> bool {
        match self {
            Self::Verified | Self::Rejected => true,
            Self::Draft | Self::Submitted => false,
        }
    }

    /// Content edits, soft-deletion, and attachment changes.
    pub fn is_editable(self) -> bool {
        self == Self::Draft
    }
}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_SUBMITTED => Ok(Self::Submitted),
            STATUS_VERIFIED => Ok(Self::Verified),
            STATUS_REJECTED => Ok(Self::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid achievement status '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for AchievementStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Returns the set of statuses that `from` may move to.
pub fn valid_transitions(from: AchievementStatus) -> &'static [AchievementStatus] {
    match from {
        AchievementStatus::Draft => &[AchievementStatus::Submitted],
        AchievementStatus::Submitted => &[AchievementStatus::Verified, AchievementStatus::Rejected],
        AchievementStatus::Verified | AchievementStatus::Rejected => &[],
    }
}

/// Validate that moving from `current` to `next` is allowed.
pub fn validate_transition(
    current: AchievementStatus,
    next: AchievementStatus,
) -> Result<(), CoreError> {
    if valid_transitions(current).contains(&next) {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Cannot move achievement from '{current}' to '{next}'"
        )))
    }
}

/// Fail with `InvalidState` unless the record may still be edited.
pub fn ensure_editable(current: AchievementStatus, action: &str) -> Result<(), CoreError> {
    if current.is_editable() {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Cannot {action} an achievement in '{current}' status; only '{STATUS_DRAFT}' is allowed"
        )))
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

/// Validate the required text fields of a new achievement.
pub fn validate_fields(title: &str, description: &str, category: &str) -> Result<(), CoreError> {
    validate_title(title)?;
    validate_description(description)?;
    validate_category(category)
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    require_non_empty("title", title)?;
    require_max_len("title", title, MAX_TITLE_LENGTH)
}

pub fn validate_description(description: &str) -> Result<(), CoreError> {
    require_non_empty("description", description)
}

pub fn validate_category(category: &str) -> Result<(), CoreError> {
    require_non_empty("category", category)?;
    require_max_len("category", category, MAX_CATEGORY_LENGTH)
}

/// A rejection must explain itself.
pub fn validate_rejection_reason(reason: &str) -> Result<(), CoreError> {
    require_non_empty("reason", reason)?;
    require_max_len("reason", reason, MAX_REASON_LENGTH)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_max_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max} characters (got {len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
