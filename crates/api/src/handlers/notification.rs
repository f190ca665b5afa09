//! Handlers for the `/notifications` resource: the in-app activity feed and
//! personal notification preferences.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use screener_core::error::CoreError;
use screener_core::notification_policy::NotificationPrefs;
use screener_core::types::DbId;
use screener_db::models::notification::ActivityNotification;
use screener_db::repositories::{ActivityRepo, NotificationPreferenceRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread activity. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

const MAX_LIMIT: i64 = 100;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

// ---------------------------------------------------------------------------
// Activity feed
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<ActivityNotification>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);
    let unread_only = params.unread_only.unwrap_or(false);

    let items =
        ActivityRepo::list_for_user(&state.pool, auth.user_id, unread_only, limit, offset).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = ActivityRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// 404 unless the row is an unread item of the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ActivityRepo::mark_read(&state.pool, notification_id, auth.user_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let marked_read = ActivityRepo::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: MarkedRead { marked_read },
    }))
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/preferences
///
/// Users who never saved preferences get the defaults.
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationPrefs>>> {
    let prefs = match NotificationPreferenceRepo::find_prefs(&state.pool, auth.user_id).await? {
        Some(row) => NotificationPrefs::from_json(&row.prefs)?,
        None => NotificationPrefs::default(),
    };
    Ok(Json(DataResponse { data: prefs }))
}

/// PUT /api/v1/notifications/preferences
///
/// Replaces the whole document. Omitted activity kinds are stored with
/// their defaults.
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(prefs): Json<NotificationPrefs>,
) -> AppResult<Json<DataResponse<NotificationPrefs>>> {
    let document = serde_json::to_value(prefs)
        .map_err(|e| AppError::InternalError(format!("Failed to encode preferences: {e}")))?;
    NotificationPreferenceRepo::upsert_prefs(&state.pool, auth.user_id, &document).await?;

    tracing::info!(user_id = auth.user_id, "Notification preferences updated");
    Ok(Json(DataResponse { data: prefs }))
}
