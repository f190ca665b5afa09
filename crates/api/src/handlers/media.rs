//! Handlers for media versions.

use axum::extract::{Path, State};
use axum::Json;
use screener_core::error::CoreError;
use screener_core::roles::can_edit_tracks;
use screener_core::types::DbId;
use screener_db::models::media::Media;
use screener_db::repositories::MediaRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::access::{ensure_media, require_project_role};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SwapVersionRequest {
    pub other_media_id: DbId,
}

/// Both media items after the swap.
#[derive(Debug, Serialize)]
pub struct SwappedVersions {
    pub media: Media,
    pub other: Media,
}

/// POST /api/v1/media/{id}/swap-version
///
/// Exchange the version numbers of two versions of the same deliverable.
pub async fn swap_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(media_id): Path<DbId>,
    Json(input): Json<SwapVersionRequest>,
) -> AppResult<Json<DataResponse<SwappedVersions>>> {
    if input.other_media_id == media_id {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot swap a media item with itself".into(),
        )));
    }

    let media = ensure_media(&state.pool, media_id).await?;
    let other = ensure_media(&state.pool, input.other_media_id).await?;

    let role = require_project_role(&state.pool, media.project_id, auth.user_id).await?;
    if !can_edit_tracks(&role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner or an editor can reorder versions".into(),
        )));
    }
    if other.project_id != media.project_id || other.version_group_id != media.version_group_id {
        return Err(AppError::Core(CoreError::Validation(
            "Both media items must be versions of the same deliverable".into(),
        )));
    }

    let (media, other) = MediaRepo::swap_versions(&state.pool, media_id, other.id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Media",
                id: media_id,
            })
        })?;

    tracing::info!(
        media_id = media.id,
        other_media_id = other.id,
        version = media.version_number,
        "Media versions swapped"
    );

    Ok(Json(DataResponse {
        data: SwappedVersions { media, other },
    }))
}
