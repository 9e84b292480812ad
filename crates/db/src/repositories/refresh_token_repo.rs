//! Repository for the `refresh_tokens` table.

use laurel_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::refresh_token::{CreateRefreshToken, RefreshToken};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_hash, issued_at, expires_at, is_revoked, \
                        revoked_at, last_used_at, ip_address, user_agent";

/// Provides persistence for refresh-token records.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Append a new record, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRefreshToken,
    ) -> Result<RefreshToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_tokens (user_id, token_hash, issued_at, expires_at, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.issued_at)
            .bind(input.expires_at)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Find a record by hash, scoped to its owner.
    ///
    /// Revoked and expired rows are returned too; the caller classifies them.
    pub async fn find_by_hash_for_user(
        pool: &PgPool,
        token_hash: &str,
        user_id: DbId,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token_hash)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a single record. Returns `true` only for the call that flipped it.
    pub async fn revoke(pool: &PgPool, id: DbId, at: Timestamp) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = true, revoked_at = $2
             WHERE id = $1 AND is_revoked = false",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all active records for a user. Returns the count revoked.
    pub async fn revoke_all_for_user(
        pool: &PgPool,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = true, revoked_at = $2
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Record usage. Missing metadata keeps the previously stored value.
    pub async fn touch(
        pool: &PgPool,
        id: DbId,
        at: Timestamp,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE refresh_tokens SET
                last_used_at = $2,
                ip_address = COALESCE($3, ip_address),
                user_agent = COALESCE($4, user_agent)
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(ip_address)
        .bind(user_agent)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Usable records for a user, newest first.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<RefreshToken>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM refresh_tokens
             WHERE user_id = $1 AND is_revoked = false AND expires_at > $2
             ORDER BY issued_at DESC, id DESC"
        );
        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Delete records whose expiry has passed. Returns the count deleted.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
