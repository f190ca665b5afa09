//! Route definitions for review links.
//!
//! `/review/{token}` is public; the link token (plus an optional password
//! header) is the credential.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::review;
use crate::state::AppState;

/// Routes mounted at `/review`.
///
/// ```text
/// GET    /{token}                   -> open_review
/// POST   /{token}/comments          -> create_review_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(review::open_review))
        .route("/{token}/comments", post(review::create_review_comment))
}

/// Routes mounted at `/review-links`.
///
/// ```text
/// DELETE /{id}                      -> delete_link
/// ```
pub fn link_router() -> Router<AppState> {
    Router::new().route("/{id}", delete(review::delete_link))
}
