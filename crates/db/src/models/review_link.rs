//! Public review link model.

use screener_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `review_links` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewLink {
    pub id: DbId,
    pub project_id: DbId,
    pub media_id: DbId,
    pub token: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub allow_download: bool,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReviewLink {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Insert parameters for a review link.
#[derive(Debug, Clone)]
pub struct CreateReviewLink {
    pub project_id: DbId,
    pub media_id: DbId,
    pub token: String,
    pub password_hash: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub allow_download: bool,
    pub created_by: DbId,
}
