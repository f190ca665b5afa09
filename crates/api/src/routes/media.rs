//! Route definitions for media items and their comments.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{comment, media, review};
use crate::state::AppState;

/// Routes mounted at `/media`.
///
/// ```text
/// GET    /{id}/comments             -> list_comments
/// POST   /{id}/comments             -> create_comment
/// POST   /{id}/swap-version         -> swap_version
/// GET    /{id}/review-links         -> list_links
/// POST   /{id}/review-links         -> create_link
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route("/{id}/swap-version", post(media::swap_version))
        .route(
            "/{id}/review-links",
            get(review::list_links).post(review::create_link),
        )
}

/// Routes mounted at `/comments`.
///
/// ```text
/// DELETE /{id}                      -> delete_comment
/// ```
pub fn comment_router() -> Router<AppState> {
    Router::new().route("/{id}", delete(comment::delete_comment))
}
