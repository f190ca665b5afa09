//! Repository for personal and per-project notification settings.

use screener_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{ProjectNotificationSetting, UserNotificationPrefs};

const PREFS_COLUMNS: &str = "id, user_id, prefs, created_at, updated_at";

const SETTING_COLUMNS: &str = "id, project_id, user_id, enabled, created_at, updated_at";

/// Provides notification preference queries.
pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    /// Stored personal preferences, if the user ever saved any.
    pub async fn find_prefs(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<UserNotificationPrefs>, sqlx::Error> {
        let query = format!("SELECT {PREFS_COLUMNS} FROM user_notification_prefs WHERE user_id = $1");
        sqlx::query_as::<_, UserNotificationPrefs>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace a user's personal preferences.
    pub async fn upsert_prefs(
        pool: &PgPool,
        user_id: DbId,
        prefs: &serde_json::Value,
    ) -> Result<UserNotificationPrefs, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_notification_prefs (user_id, prefs)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_user_notification_prefs_user
             DO UPDATE SET prefs = EXCLUDED.prefs
             RETURNING {PREFS_COLUMNS}"
        );
        sqlx::query_as::<_, UserNotificationPrefs>(&query)
            .bind(user_id)
            .bind(prefs)
            .fetch_one(pool)
            .await
    }

    /// Project-level toggle for a user. `None` means never set (enabled).
    pub async fn project_enabled(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<bool>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT enabled FROM project_notification_settings
             WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Insert or update the project-level toggle for a user.
    pub async fn set_project_enabled(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        enabled: bool,
    ) -> Result<ProjectNotificationSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_notification_settings (project_id, user_id, enabled)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_project_notification_settings_project_user
             DO UPDATE SET enabled = EXCLUDED.enabled
             RETURNING {SETTING_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectNotificationSetting>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(enabled)
            .fetch_one(pool)
            .await
    }
}
