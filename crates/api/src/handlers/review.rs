//! Review links: owner management and the public, token-addressed review
//! page where clients and guests watch media and leave comments.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use screener_core::comment::{validate_comment, validate_guest, CommentSource};
use screener_core::error::CoreError;
use screener_core::review_link::{
    ensure_not_expired, generate_token, is_well_formed_token, validate_expiry, validate_password,
};
use screener_core::types::{DbId, Timestamp};
use screener_db::models::comment::{CommentWithAuthor, CreateComment, MediaComment};
use screener_db::models::review_link::{CreateReviewLink, ReviewLink};
use screener_db::repositories::{CommentRepo, ReviewLinkRepo};
use screener_events::CommentCreated;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::handlers::access::{ensure_media, ensure_project, require_owner};
use crate::handlers::comment::ensure_parent;
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the review-link password.
pub const REVIEW_PASSWORD_HEADER: &str = "x-review-password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateReviewLinkRequest {
    pub password: Option<String>,
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub allow_download: bool,
}

/// A review link as shown to its owner.
#[derive(Debug, Serialize)]
pub struct ReviewLinkInfo {
    #[serde(flatten)]
    pub link: ReviewLink,
    pub has_password: bool,
    pub url: String,
}

/// What a reviewer sees when opening a link.
#[derive(Debug, Serialize)]
pub struct ReviewPage {
    pub media: ReviewMedia,
    pub allow_download: bool,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Serialize)]
pub struct ReviewMedia {
    pub id: DbId,
    pub title: String,
    pub url: String,
    pub media_type: String,
    pub version_number: i32,
}

/// Request body for a comment left through a review link.
#[derive(Debug, Deserialize)]
pub struct ReviewCommentRequest {
    #[serde(default)]
    pub content: String,
    pub parent_comment_id: Option<DbId>,
    pub annotation: Option<serde_json::Value>,
    pub timestamp_seconds: Option<f64>,
    pub guest_email: Option<String>,
    pub guest_session_id: Option<String>,
    pub guest_name: Option<String>,
}

fn link_info(state: &AppState, link: ReviewLink) -> ReviewLinkInfo {
    ReviewLinkInfo {
        has_password: link.has_password(),
        url: state.config.app_url(&format!("/review/{}", link.token)),
        link,
    }
}

// ---------------------------------------------------------------------------
// Owner management
// ---------------------------------------------------------------------------

/// GET /api/v1/media/{id}/review-links
pub async fn list_links(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(media_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ReviewLinkInfo>>>> {
    let media = ensure_media(&state.pool, media_id).await?;
    let project = ensure_project(&state.pool, media.project_id).await?;
    require_owner(&project, auth.user_id)?;

    let links = ReviewLinkRepo::list_for_media(&state.pool, media_id)
        .await?
        .into_iter()
        .map(|l| link_info(&state, l))
        .collect();
    Ok(Json(DataResponse { data: links }))
}

/// POST /api/v1/media/{id}/review-links
pub async fn create_link(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(media_id): Path<DbId>,
    Json(input): Json<CreateReviewLinkRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ReviewLinkInfo>>)> {
    let media = ensure_media(&state.pool, media_id).await?;
    let project = ensure_project(&state.pool, media.project_id).await?;
    require_owner(&project, auth.user_id)?;

    let password = input.password.as_deref().filter(|p| !p.is_empty());
    validate_password(password)?;
    validate_expiry(input.expires_at, Utc::now())?;

    let password_hash = password
        .map(hash_password)
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let link = ReviewLinkRepo::create(
        &state.pool,
        &CreateReviewLink {
            project_id: project.id,
            media_id,
            token: generate_token(),
            password_hash,
            expires_at: input.expires_at,
            allow_download: input.allow_download,
            created_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        link_id = link.id,
        media_id,
        protected = link.has_password(),
        "Review link created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: link_info(&state, link),
        }),
    ))
}

/// DELETE /api/v1/review-links/{id}
pub async fn delete_link(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(link_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let link = ReviewLinkRepo::find_by_id(&state.pool, link_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ReviewLink",
                id: link_id,
            })
        })?;
    let project = ensure_project(&state.pool, link.project_id).await?;
    require_owner(&project, auth.user_id)?;

    ReviewLinkRepo::delete(&state.pool, link_id).await?;
    tracing::info!(link_id, "Review link deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Public review page
// ---------------------------------------------------------------------------

/// Resolve a token to a usable link: it must exist, be unexpired, and the
/// password header must verify when the link is protected.
async fn open_link(state: &AppState, token: &str, headers: &HeaderMap) -> AppResult<ReviewLink> {
    let not_found = || AppError::NotFound("Review link not found".into());
    if !is_well_formed_token(token) {
        return Err(not_found());
    }
    let link = ReviewLinkRepo::find_by_token(&state.pool, token)
        .await?
        .ok_or_else(not_found)?;

    ensure_not_expired(link.expires_at, Utc::now())?;

    if let Some(hash) = &link.password_hash {
        let supplied = headers
            .get(REVIEW_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "This review link requires a password".into(),
                ))
            })?;
        let valid = verify_password(supplied, hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !valid {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Incorrect review link password".into(),
            )));
        }
    }

    Ok(link)
}

/// GET /api/v1/review/{token}
pub async fn open_review(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<ReviewPage>>> {
    let link = open_link(&state, &token, &headers).await?;
    let media = ensure_media(&state.pool, link.media_id).await?;
    let comments = CommentRepo::list_for_media(&state.pool, media.id).await?;

    Ok(Json(DataResponse {
        data: ReviewPage {
            media: ReviewMedia {
                id: media.id,
                title: media.title,
                url: media.url,
                media_type: media.media_type,
                version_number: media.version_number,
            },
            allow_download: link.allow_download,
            comments,
        },
    }))
}

/// POST /api/v1/review/{token}/comments
///
/// Signed-in reviewers comment as themselves; everybody else comments as a
/// guest identified by email and/or browser session id.
pub async fn create_review_comment(
    OptionalAuthUser(auth): OptionalAuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ReviewCommentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<MediaComment>>)> {
    let link = open_link(&state, &token, &headers).await?;

    let validated = validate_comment(&input.content, input.annotation, input.timestamp_seconds)?;
    ensure_parent(&state.pool, input.parent_comment_id, link.media_id).await?;

    let mut new_comment = CreateComment {
        media_id: link.media_id,
        content: validated.content,
        parent_comment_id: input.parent_comment_id,
        annotation: validated.annotation,
        timestamp_seconds: validated.timestamp_seconds,
        source: CommentSource::ReviewLink.as_str().to_string(),
        ..CreateComment::default()
    };
    match &auth {
        Some(user) => new_comment.user_id = Some(user.user_id),
        None => {
            let guest = validate_guest(
                input.guest_email.as_deref(),
                input.guest_session_id.as_deref(),
                input.guest_name.as_deref(),
            )?;
            new_comment.guest_email = guest.email;
            new_comment.guest_session_id = guest.session_id;
            new_comment.guest_name = guest.name;
        }
    }

    let comment = CommentRepo::create(&state.pool, &new_comment).await?;

    tracing::info!(
        comment_id = comment.id,
        media_id = link.media_id,
        link_id = link.id,
        guest = auth.is_none(),
        "Review comment created"
    );

    state.event_bus.publish(
        CommentCreated {
            comment_id: comment.id,
            media_id: link.media_id,
            project_id: link.project_id,
            source: CommentSource::ReviewLink,
            review_token: Some(token),
        }
        .into_event(auth.map(|u| u.user_id)),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}
