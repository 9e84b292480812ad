//! Account administration: user creation, listing, activation, soft
//! deletion, advisor assignment, and self-service profiles.
//!
//! Deactivating or deleting an account also revokes its refresh records, so
//! its sessions end once the outstanding access tokens expire.

use std::sync::Arc;

use laurel_core::clock::Clock;
use laurel_core::error::CoreError;
use laurel_core::roles::{validate_advisor_assignment, Actor, Role};
use laurel_core::types::DbId;
use laurel_db::models::user::{CreateUser, UpdateUser, User, UserFilter};
use laurel_db::store::{RefreshTokenStore, UserStore};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};

const ENTITY: &str = "User";

/// Input for [`AccountService::create_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub student_number: Option<String>,
}

/// Input for [`AccountService::update_profile`]. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }

    /// Create an account. Admin only; a duplicate email is a `Conflict`.
    pub async fn create_user(&self, actor: &Actor, input: NewAccount) -> Result<User, CoreError> {
        actor.require_admin()?;

        let name = normalize_name(&input.name)?;
        let email = normalize_email(&input.email)?;
        validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
            .map_err(CoreError::Validation)?;

        let student_number = match input.role {
            Role::Student => {
                let number = input
                    .student_number
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        CoreError::Validation("student_number is required for students".into())
                    })?;
                Some(number.to_string())
            }
            Role::Advisor | Role::Admin => None,
        };

        let password_hash = hash(&input.password)?;

        let create = CreateUser {
            name,
            email,
            password_hash,
            role: input.role,
            student_number,
        };
        Ok(self.users.create(&create, self.clock.now()).await?)
    }

    /// Point a student at an advisor. Admin only.
    pub async fn assign_advisor(
        &self,
        actor: &Actor,
        student_id: DbId,
        advisor_id: DbId,
    ) -> Result<User, CoreError> {
        actor.require_admin()?;

        let student = self.find_live(student_id).await?;
        let advisor = self.find_live(advisor_id).await?;
        validate_advisor_assignment(student.role, advisor.role)?;
        for user in [&student, &advisor] {
            if !user.is_active {
                return Err(CoreError::Validation(format!(
                    "User {} is inactive",
                    user.id
                )));
            }
        }

        self.users
            .set_advisor(student_id, advisor_id, self.clock.now())
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, student_id))
    }

    /// Students assigned to an advisor. The advisor themself or an admin.
    pub async fn list_advisees(
        &self,
        actor: &Actor,
        advisor_id: DbId,
    ) -> Result<Vec<User>, CoreError> {
        match actor.role {
            Role::Admin => {}
            Role::Advisor if actor.user_id == advisor_id => {}
            Role::Advisor | Role::Student => {
                return Err(CoreError::Forbidden(
                    "Only the advisor or an admin may list advisees".into(),
                ))
            }
        }

        let advisor = self.find_live(advisor_id).await?;
        if advisor.role != Role::Advisor {
            return Err(CoreError::not_found("Advisor", advisor_id));
        }
        Ok(self.users.list_advisees(advisor_id).await?)
    }

    /// The caller's own account.
    pub async fn profile(&self, actor: &Actor) -> Result<User, CoreError> {
        self.find_live(actor.user_id).await
    }

    /// Non-deleted accounts matching `filter`. Admin only.
    pub async fn list_users(
        &self,
        actor: &Actor,
        filter: &UserFilter,
    ) -> Result<Vec<User>, CoreError> {
        actor.require_admin()?;
        Ok(self.users.list(filter).await?)
    }

    /// Active advisors, for picking an assignment target. Admin only.
    pub async fn list_advisors(&self, actor: &Actor) -> Result<Vec<User>, CoreError> {
        actor.require_admin()?;
        let filter = UserFilter {
            role: Some(Role::Advisor),
            search: None,
            active_only: true,
        };
        Ok(self.users.list(&filter).await?)
    }

    /// Change the caller's own name, email, or password.
    ///
    /// A password change revokes every refresh record of the caller.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        input: ProfileUpdate,
    ) -> Result<User, CoreError> {
        let mut update = UpdateUser::default();
        if let Some(name) = &input.name {
            update.name = Some(normalize_name(name)?);
        }
        if let Some(email) = &input.email {
            update.email = Some(normalize_email(email)?);
        }
        if let Some(password) = &input.password {
            validate_password_strength(password, MIN_PASSWORD_LENGTH)
                .map_err(CoreError::Validation)?;
            update.password_hash = Some(hash(password)?);
        }
        if update.is_empty() {
            return self.find_live(actor.user_id).await;
        }

        let now = self.clock.now();
        let user = self
            .users
            .update(actor.user_id, &update, now)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, actor.user_id))?;
        if update.password_hash.is_some() {
            self.tokens.revoke_all_for_user(user.id, now).await?;
        }
        Ok(user)
    }

    /// Activate or deactivate an account. Admin only; admins cannot
    /// deactivate themselves. Deactivation revokes the account's sessions.
    pub async fn set_active(
        &self,
        actor: &Actor,
        user_id: DbId,
        active: bool,
    ) -> Result<User, CoreError> {
        actor.require_admin()?;
        if !active && actor.user_id == user_id {
            return Err(CoreError::Validation(
                "Admins cannot deactivate their own account".into(),
            ));
        }

        let now = self.clock.now();
        let user = self
            .users
            .set_active(user_id, active, now)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, user_id))?;
        if !active {
            self.tokens.revoke_all_for_user(user_id, now).await?;
        }
        Ok(user)
    }

    /// Soft-delete an account and revoke its sessions. Admin only; admins
    /// cannot delete themselves. Deleting twice is `NotFound`.
    pub async fn delete_user(&self, actor: &Actor, user_id: DbId) -> Result<(), CoreError> {
        actor.require_admin()?;
        if actor.user_id == user_id {
            return Err(CoreError::Validation(
                "Admins cannot delete their own account".into(),
            ));
        }

        let now = self.clock.now();
        if !self.users.soft_delete(user_id, now).await? {
            return Err(CoreError::not_found(ENTITY, user_id));
        }
        self.tokens.revoke_all_for_user(user_id, now).await?;
        Ok(())
    }

    async fn find_live(&self, id: DbId) -> Result<User, CoreError> {
        self.users
            .find_by_id(id)
            .await?
            .filter(|u| !u.is_deleted)
            .ok_or_else(|| CoreError::not_found(ENTITY, id))
    }
}

fn normalize_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("name is required".into()));
    }
    Ok(name.to_string())
}

/// Emails are stored lowercased; uniqueness and lookup ignore case.
fn normalize_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(CoreError::Validation(format!("Invalid email '{email}'")));
    }
    Ok(email)
}

fn hash(password: &str) -> Result<String, CoreError> {
    hash_password(password)
        .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))
}
