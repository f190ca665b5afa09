//! Activity feed and notification preference models.

use screener_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `activity_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityNotification {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: DbId,
    pub media_id: Option<DbId>,
    pub comment_id: Option<DbId>,
    pub kind: String,
    pub actor_name: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert parameters for an activity row.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: DbId,
    pub project_id: DbId,
    pub media_id: Option<DbId>,
    pub comment_id: Option<DbId>,
    pub kind: String,
    pub actor_name: String,
    pub message: String,
}

/// A row from the `user_notification_prefs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserNotificationPrefs {
    pub id: DbId,
    pub user_id: DbId,
    pub prefs: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `project_notification_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectNotificationSetting {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for the project-level toggle.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectNotificationSetting {
    pub enabled: bool,
}
