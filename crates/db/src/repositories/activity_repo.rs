//! Repository for the `activity_notifications` table.

use screener_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{ActivityNotification, NewActivity};

/// Column list for `activity_notifications` queries.
const COLUMNS: &str = "id, user_id, project_id, media_id, comment_id, kind, actor_name, \
    message, is_read, read_at, created_at, updated_at";

/// Provides the in-app activity feed.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Insert an activity row, returning the generated ID.
    pub async fn create(pool: &PgPool, input: &NewActivity) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO activity_notifications
                (user_id, project_id, media_id, comment_id, kind, actor_name, message)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.project_id)
        .bind(input.media_id)
        .bind(input.comment_id)
        .bind(&input.kind)
        .bind(&input.actor_name)
        .bind(&input.message)
        .fetch_one(pool)
        .await
    }

    /// List a user's activity, newest first.
    ///
    /// When `unread_only` is `true`, only rows with `is_read = false` are
    /// returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityNotification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM activity_notifications \
             WHERE user_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ActivityNotification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark one row read. Returns `false` if it was not an unread row of this user.
    pub async fn mark_read(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE activity_notifications \
             SET is_read = true, read_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND is_read = false",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread row of a user read, returning how many changed.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE activity_notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Number of unread rows for a user.
    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM activity_notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
