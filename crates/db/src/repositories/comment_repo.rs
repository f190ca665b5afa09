//! Repository for the `media_comments` table.

use screener_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::{CommentWithAuthor, CommenterRow, CreateComment, MediaComment};

/// Column list shared across queries.
const COLUMNS: &str = "id, media_id, user_id, guest_email, guest_session_id, guest_name, \
    content, parent_comment_id, annotation, timestamp_seconds, source, created_at, updated_at";

/// Provides comment queries.
pub struct CommentRepo;

impl CommentRepo {
    /// Insert a comment, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<MediaComment, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_comments
                (media_id, user_id, guest_email, guest_session_id, guest_name, content,
                 parent_comment_id, annotation, timestamp_seconds, source)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaComment>(&query)
            .bind(input.media_id)
            .bind(input.user_id)
            .bind(&input.guest_email)
            .bind(&input.guest_session_id)
            .bind(&input.guest_name)
            .bind(&input.content)
            .bind(input.parent_comment_id)
            .bind(&input.annotation)
            .bind(input.timestamp_seconds)
            .bind(&input.source)
            .fetch_one(pool)
            .await
    }

    /// Find a comment by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MediaComment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_comments WHERE id = $1");
        sqlx::query_as::<_, MediaComment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The full thread of a media item in posting order.
    pub async fn list_for_media(
        pool: &PgPool,
        media_id: DbId,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.media_id, c.user_id,
                    COALESCE(u.display_name, u.email, c.guest_name, c.guest_email) AS author_name,
                    c.content, c.parent_comment_id, c.annotation, c.timestamp_seconds,
                    c.source, c.created_at
             FROM media_comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.media_id = $1
             ORDER BY c.created_at, c.id",
        )
        .bind(media_id)
        .fetch_all(pool)
        .await
    }

    /// Distinct commenters on a media item, in first-seen order.
    ///
    /// Authenticated commenters carry their account email; guests carry the
    /// email and session they commented with.
    pub async fn list_commenters(
        pool: &PgPool,
        media_id: DbId,
    ) -> Result<Vec<CommenterRow>, sqlx::Error> {
        sqlx::query_as::<_, CommenterRow>(
            "SELECT user_id, email, session_id, display_name
             FROM (
                SELECT c.user_id,
                       COALESCE(u.email, c.guest_email) AS email,
                       CASE WHEN c.user_id IS NULL THEN c.guest_session_id END AS session_id,
                       COALESCE(u.display_name, c.guest_name) AS display_name,
                       MIN(c.id) AS first_id
                FROM media_comments c
                LEFT JOIN users u ON u.id = c.user_id
                WHERE c.media_id = $1
                GROUP BY 1, 2, 3, 4
             ) commenters
             ORDER BY first_id",
        )
        .bind(media_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a comment and its replies. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media_comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
