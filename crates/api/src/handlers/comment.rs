//! Handlers for dashboard comments on media items.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use screener_core::comment::{validate_comment, CommentSource};
use screener_core::error::CoreError;
use screener_core::types::DbId;
use screener_db::models::comment::{CommentWithAuthor, CreateComment, MediaComment};
use screener_db::repositories::CommentRepo;
use screener_events::CommentCreated;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::handlers::access::{ensure_media, ensure_project, require_project_role};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for a new comment.
#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    #[serde(default)]
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub annotation: Option<serde_json::Value>,
    pub timestamp_seconds: Option<f64>,
}

/// Reject a parent comment that lives on another media item.
pub(crate) async fn ensure_parent(
    pool: &PgPool,
    parent_id: Option<DbId>,
    media_id: DbId,
) -> AppResult<()> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let parent = CommentRepo::find_by_id(pool, parent_id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id: parent_id,
        })
    })?;
    if parent.media_id != media_id {
        return Err(AppError::Core(CoreError::Validation(
            "Parent comment belongs to a different media item".into(),
        )));
    }
    Ok(())
}

/// GET /api/v1/media/{id}/comments
pub async fn list_comments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(media_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CommentWithAuthor>>>> {
    let media = ensure_media(&state.pool, media_id).await?;
    require_project_role(&state.pool, media.project_id, auth.user_id).await?;

    let comments = CommentRepo::list_for_media(&state.pool, media_id).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/media/{id}/comments
///
/// Stores the comment, then publishes `comment.created` so the
/// notification fan-out runs in the background.
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(media_id): Path<DbId>,
    Json(input): Json<NewCommentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<MediaComment>>)> {
    let media = ensure_media(&state.pool, media_id).await?;
    require_project_role(&state.pool, media.project_id, auth.user_id).await?;

    let validated = validate_comment(&input.content, input.annotation, input.timestamp_seconds)?;
    ensure_parent(&state.pool, input.parent_comment_id, media_id).await?;

    let comment = CommentRepo::create(
        &state.pool,
        &CreateComment {
            media_id,
            user_id: Some(auth.user_id),
            content: validated.content,
            parent_comment_id: input.parent_comment_id,
            annotation: validated.annotation,
            timestamp_seconds: validated.timestamp_seconds,
            source: CommentSource::Dashboard.as_str().to_string(),
            ..CreateComment::default()
        },
    )
    .await?;

    tracing::info!(
        comment_id = comment.id,
        media_id,
        user_id = auth.user_id,
        is_reply = comment.parent_comment_id.is_some(),
        "Comment created"
    );

    state.event_bus.publish(
        CommentCreated {
            comment_id: comment.id,
            media_id,
            project_id: media.project_id,
            source: CommentSource::Dashboard,
            review_token: None,
        }
        .into_event(Some(auth.user_id)),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// DELETE /api/v1/comments/{id}
///
/// Allowed for the comment's author and the project owner. Replies are
/// removed with their parent.
pub async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let comment = CommentRepo::find_by_id(&state.pool, comment_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Comment",
                id: comment_id,
            })
        })?;
    let media = ensure_media(&state.pool, comment.media_id).await?;
    let project = ensure_project(&state.pool, media.project_id).await?;

    let is_author = comment.user_id == Some(auth.user_id);
    if !is_author && project.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the author or the project owner can delete this comment".into(),
        )));
    }

    CommentRepo::delete(&state.pool, comment_id).await?;
    tracing::info!(comment_id, user_id = auth.user_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
