//! Media comment models.

use screener_core::identity::CommenterIdentity;
use screener_core::recipients::Commenter;
use screener_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `media_comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaComment {
    pub id: DbId,
    pub media_id: DbId,
    pub user_id: Option<DbId>,
    pub guest_email: Option<String>,
    #[serde(skip_serializing)]
    pub guest_session_id: Option<String>,
    pub guest_name: Option<String>,
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub annotation: Option<serde_json::Value>,
    pub timestamp_seconds: Option<f64>,
    pub source: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MediaComment {
    /// Identity of the author as stored on the row.
    ///
    /// Authenticated authors carry no email here; callers that need it
    /// must look up the user.
    pub fn author_identity(&self) -> CommenterIdentity {
        match self.user_id {
            Some(user_id) => CommenterIdentity::user(user_id, None),
            None => CommenterIdentity::guest(
                self.guest_email.clone(),
                self.guest_session_id.clone(),
            ),
        }
    }
}

/// A comment joined with its author's account, for thread listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentWithAuthor {
    pub id: DbId,
    pub media_id: DbId,
    pub user_id: Option<DbId>,
    pub author_name: Option<String>,
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub annotation: Option<serde_json::Value>,
    pub timestamp_seconds: Option<f64>,
    pub source: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a comment. Exactly one of `user_id` or the guest
/// fields identifies the author.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateComment {
    pub media_id: DbId,
    pub user_id: Option<DbId>,
    pub guest_email: Option<String>,
    pub guest_session_id: Option<String>,
    pub guest_name: Option<String>,
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub annotation: Option<serde_json::Value>,
    pub timestamp_seconds: Option<f64>,
    pub source: String,
}

/// One distinct commenter on a media item.
#[derive(Debug, Clone, FromRow)]
pub struct CommenterRow {
    pub user_id: Option<DbId>,
    pub email: Option<String>,
    pub session_id: Option<String>,
    pub display_name: Option<String>,
}

impl From<CommenterRow> for Commenter {
    fn from(row: CommenterRow) -> Self {
        let identity = match row.user_id {
            Some(user_id) => CommenterIdentity::user(user_id, row.email),
            None => CommenterIdentity::guest(row.email, row.session_id),
        };
        Commenter {
            identity,
            display_name: row.display_name,
        }
    }
}
