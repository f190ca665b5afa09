//! Media item model and DTOs.

use screener_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `media` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Media {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub url: String,
    pub media_type: String,
    /// Shared by every version of the same deliverable.
    pub version_group_id: uuid::Uuid,
    pub version_number: i32,
    pub uploaded_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a media item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedia {
    pub project_id: DbId,
    pub title: String,
    pub url: String,
    pub media_type: String,
    /// Omit to start a new version group.
    pub version_group_id: Option<uuid::Uuid>,
    pub version_number: Option<i32>,
    pub uploaded_by: Option<DbId>,
}
