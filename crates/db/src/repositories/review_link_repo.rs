//! Repository for the `review_links` table.

use screener_core::types::DbId;
use sqlx::PgPool;

use crate::models::review_link::{CreateReviewLink, ReviewLink};

/// Column list shared across queries.
const COLUMNS: &str = "id, project_id, media_id, token, password_hash, expires_at, \
    allow_download, created_by, created_at, updated_at";

/// Provides review link queries.
pub struct ReviewLinkRepo;

impl ReviewLinkRepo {
    /// Insert a review link.
    pub async fn create(pool: &PgPool, input: &CreateReviewLink) -> Result<ReviewLink, sqlx::Error> {
        let query = format!(
            "INSERT INTO review_links
                (project_id, media_id, token, password_hash, expires_at, allow_download, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReviewLink>(&query)
            .bind(input.project_id)
            .bind(input.media_id)
            .bind(&input.token)
            .bind(&input.password_hash)
            .bind(input.expires_at)
            .bind(input.allow_download)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a link by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ReviewLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM review_links WHERE id = $1");
        sqlx::query_as::<_, ReviewLink>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a link by its public token.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ReviewLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM review_links WHERE token = $1");
        sqlx::query_as::<_, ReviewLink>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Links of one media item, newest first.
    pub async fn list_for_media(
        pool: &PgPool,
        media_id: DbId,
    ) -> Result<Vec<ReviewLink>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM review_links WHERE media_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ReviewLink>(&query)
            .bind(media_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a link. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM review_links WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
