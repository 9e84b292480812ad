//! User entity model and DTOs.

use laurel_core::roles::{Actor, Role};
use laurel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    /// Enrolment number, students only.
    pub student_number: Option<String>,
    /// Assigned advisor, students only.
    pub advisor_id: Option<DbId>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Active and not soft-deleted.
    pub fn can_sign_in(&self) -> bool {
        self.is_active && !self.is_deleted
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub student_number: Option<String>,
    pub advisor_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            student_number: user.student_number.clone(),
            advisor_id: user.advisor_id,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_number: Option<String>,
}

/// Partial update of a user row. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub student_number: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.student_number.is_none()
    }
}

/// Filter for listing users. Soft-deleted rows are never listed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring of name, email, or student number.
    pub search: Option<String>,
    /// Only active accounts when set.
    #[serde(default)]
    pub active_only: bool,
}

impl UserFilter {
    /// Trimmed, lowercased search term, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether `user` passes the filter. Mirrors the SQL in `UserRepo::list`.
    pub fn matches(&self, user: &User) -> bool {
        if user.is_deleted {
            return false;
        }
        if self.active_only && !user.is_active {
            return false;
        }
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                user.name.to_lowercase().contains(&term)
                    || user.email.to_lowercase().contains(&term)
                    || user
                        .student_number
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&term))
            }
        }
    }
}
