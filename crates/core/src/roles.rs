//! User roles and the authenticated caller identity.
//!
//! The stored role column must hold one of [`Role::as_str`]'s values; the
//! migration enforces this with a CHECK constraint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_ADVISOR: &str = "advisor";
pub const ROLE_ADMIN: &str = "admin";

/// Closed set of business roles. Immutable once an account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Advisor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => ROLE_STUDENT,
            Self::Advisor => ROLE_ADVISOR,
            Self::Admin => ROLE_ADMIN,
        }
    }

    /// Whether this role may verify or reject submitted achievements.
    pub fn can_review(self) -> bool {
        match self {
            Self::Advisor | Self::Admin => true,
            Self::Student => false,
        }
    }

    /// Whether this role may see every student's achievements.
    pub fn sees_all_achievements(self) -> bool {
        self.can_review()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_STUDENT => Ok(Self::Student),
            ROLE_ADVISOR => Ok(Self::Advisor),
            ROLE_ADMIN => Ok(Self::Admin),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {ROLE_STUDENT}, {ROLE_ADVISOR}, {ROLE_ADMIN}"
            ))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The caller of an operation, resolved upstream from a validated access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Fail with `Forbidden` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), CoreError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Student | Role::Advisor => {
                Err(CoreError::Forbidden("Admin role required".into()))
            }
        }
    }

    /// Fail with `Forbidden` unless the caller is an advisor or admin.
    pub fn require_reviewer(&self) -> Result<(), CoreError> {
        if self.role.can_review() {
            Ok(())
        } else {
            Err(CoreError::Forbidden("Advisor or Admin role required".into()))
        }
    }
}

/// Check the advisor-assignment invariant: only students carry an advisor
/// reference and only advisors may be its target.
pub fn validate_advisor_assignment(student: Role, advisor: Role) -> Result<(), CoreError> {
    if student != Role::Student {
        return Err(CoreError::Validation(format!(
            "Only {ROLE_STUDENT} accounts can be assigned an advisor (got '{student}')"
        )));
    }
    if advisor != Role::Advisor {
        return Err(CoreError::Validation(format!(
            "Advisor must have the {ROLE_ADVISOR} role (got '{advisor}')"
        )));
    }
    Ok(())
}
