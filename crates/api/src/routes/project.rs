//! Route definitions for project-scoped resources and invitations.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{project, track};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /{id}/members              -> list_members
/// PUT    /{id}/notifications        -> update_notification_setting
/// POST   /{id}/invitations          -> create_invitation
/// GET    /{id}/tracks               -> list_tracks
/// POST   /{id}/tracks               -> start_round
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/members", get(project::list_members))
        .route(
            "/{id}/notifications",
            put(project::update_notification_setting),
        )
        .route("/{id}/invitations", post(project::create_invitation))
        .route(
            "/{id}/tracks",
            get(track::list_tracks).post(track::start_round),
        )
}

/// Routes mounted at `/invitations`.
///
/// ```text
/// POST   /{token}/accept            -> accept_invitation
/// ```
pub fn invitation_router() -> Router<AppState> {
    Router::new().route("/{token}/accept", post(project::accept_invitation))
}
