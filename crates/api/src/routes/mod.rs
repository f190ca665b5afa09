pub mod auth;
pub mod health;
pub mod media;
pub mod notification;
pub mod project;
pub mod review;
pub mod track;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
///
/// /projects/{id}/members                           owner and members
/// /projects/{id}/notifications                     per-project toggle (PUT)
/// /projects/{id}/invitations                       invite (POST, owner only)
/// /projects/{id}/tracks                            list, start round
/// /invitations/{token}/accept                      accept (POST)
///
/// /media/{id}/comments                             list, create
/// /media/{id}/swap-version                         swap version numbers (POST)
/// /media/{id}/review-links                         list, create (owner only)
/// /comments/{id}                                   delete
/// /review-links/{id}                               delete (owner only)
///
/// /review/{token}                                  review page (public)
/// /review/{token}/comments                         comment (public)
///
/// /tracks/{id}                                     get
/// /tracks/{id}/steps                               add, restructure
/// /tracks/{id}/steps/{index}                       update, remove
/// /tracks/{id}/steps/{index}/status                set status (PUT)
/// /tracks/{id}/steps/{index}/images                upload image (POST)
/// /tracks/{id}/final                               complete, reopen
/// /tracks/{id}/decision                            client decision (POST)
///
/// /notifications                                   activity feed
/// /notifications/read-all                          mark all read (POST)
/// /notifications/unread-count                      unread count
/// /notifications/{id}/read                         mark read (POST)
/// /notifications/preferences                       get, replace
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/invitations", project::invitation_router())
        .nest("/media", media::router())
        .nest("/comments", media::comment_router())
        .nest("/review", review::router())
        .nest("/review-links", review::link_router())
        .nest("/tracks", track::router())
        .nest("/notifications", notification::router())
}
