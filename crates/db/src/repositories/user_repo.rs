//! Repository for the `users` table.

use laurel_core::roles::ROLE_STUDENT;
use laurel_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User, UserFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, role, student_number, advisor_id, \
                        is_active, is_deleted, created_at, updated_at";

/// Provides account operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateUser,
        now: Timestamp,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role, student_number, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .bind(&input.student_number)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID, including soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a non-deleted user by email (case-insensitive, matching `uq_users_email`).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) AND is_deleted = false"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Point a student at an advisor.
    ///
    /// Returns `None` if the student row is missing, deleted, or not a student.
    pub async fn set_advisor(
        pool: &PgPool,
        student_id: DbId,
        advisor_id: DbId,
        now: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET advisor_id = $2, updated_at = $3
             WHERE id = $1 AND role = '{ROLE_STUDENT}' AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(student_id)
            .bind(advisor_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// List the non-deleted students assigned to an advisor, by name.
    pub async fn list_advisees(pool: &PgPool, advisor_id: DbId) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE advisor_id = $1 AND is_deleted = false
             ORDER BY name ASC, id ASC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(advisor_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update to a non-deleted user. `NULL` binds keep the column.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
        now: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                student_number = COALESCE($5, student_number),
                updated_at = $6
             WHERE id = $1 AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.student_number)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Activate or deactivate a non-deleted user.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        active: bool,
        now: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET is_active = $2, updated_at = $3
             WHERE id = $1 AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(active)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a user. Returns `true` only if this call flipped the flag.
    pub async fn soft_delete(pool: &PgPool, id: DbId, now: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = true, updated_at = $2
             WHERE id = $1 AND is_deleted = false",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List non-deleted users matching the filter, by name.
    pub async fn list(pool: &PgPool, filter: &UserFilter) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE is_deleted = false
               AND ($1::TEXT IS NULL OR role = $1)
               AND ($2::TEXT IS NULL
                    OR strpos(LOWER(name), $2) > 0
                    OR strpos(LOWER(email), $2) > 0
                    OR strpos(LOWER(COALESCE(student_number, '')), $2) > 0)
               AND ($3 = false OR is_active = true)
             ORDER BY name ASC, id ASC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(filter.role.map(|r| r.as_str()))
            .bind(filter.search_term())
            .bind(filter.active_only)
            .fetch_all(pool)
            .await
    }
}
