//! Repository for the `media` table.

use screener_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreateMedia, Media};

/// Column list shared across queries.
const COLUMNS: &str = "id, project_id, title, url, media_type, version_group_id, \
    version_number, uploaded_by, created_at, updated_at";

/// Provides media queries.
pub struct MediaRepo;

impl MediaRepo {
    /// Insert a media item. Without a group a new one is started at version 1.
    pub async fn create(pool: &PgPool, input: &CreateMedia) -> Result<Media, sqlx::Error> {
        let query = format!(
            "INSERT INTO media
                (project_id, title, url, media_type, version_group_id, version_number, uploaded_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, gen_random_uuid()), COALESCE($6, 1), $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.url)
            .bind(&input.media_type)
            .bind(input.version_group_id)
            .bind(input.version_number)
            .bind(input.uploaded_by)
            .fetch_one(pool)
            .await
    }

    /// Find a media item by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media WHERE id = $1");
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Swap the version numbers of two media items in one transaction.
    ///
    /// Both rows are locked first. Returns `None` if either row is missing,
    /// otherwise the two updated rows in argument order.
    pub async fn swap_versions(
        pool: &PgPool,
        first_id: DbId,
        second_id: DbId,
    ) -> Result<Option<(Media, Media)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let lock_query =
            format!("SELECT {COLUMNS} FROM media WHERE id = ANY($1) ORDER BY id FOR UPDATE");
        let rows = sqlx::query_as::<_, Media>(&lock_query)
            .bind(vec![first_id, second_id])
            .fetch_all(&mut *tx)
            .await?;

        let first = rows.iter().find(|m| m.id == first_id);
        let second = rows.iter().find(|m| m.id == second_id);
        let (Some(first), Some(second)) = (first, second) else {
            return Ok(None);
        };

        let update_query =
            format!("UPDATE media SET version_number = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let updated_first = sqlx::query_as::<_, Media>(&update_query)
            .bind(first.id)
            .bind(second.version_number)
            .fetch_one(&mut *tx)
            .await?;
        let updated_second = sqlx::query_as::<_, Media>(&update_query)
            .bind(second.id)
            .bind(first.version_number)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((updated_first, updated_second)))
    }
}
