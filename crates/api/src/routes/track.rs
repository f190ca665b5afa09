//! Route definitions for `/tracks`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::track;
use crate::state::AppState;
use crate::uploads::MAX_IMAGE_BYTES;

/// Slack for multipart boundaries and headers around the image itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Routes mounted at `/tracks`.
///
/// ```text
/// GET    /{id}                          -> get_track
/// POST   /{id}/steps                    -> add_step
/// PUT    /{id}/steps                    -> restructure_steps
/// PUT    /{id}/steps/{index}            -> update_step
/// DELETE /{id}/steps/{index}            -> remove_step
/// PUT    /{id}/steps/{index}/status     -> set_step_status
/// POST   /{id}/steps/{index}/images     -> upload_step_image (multipart)
/// POST   /{id}/final                    -> complete_final_step
/// DELETE /{id}/final                    -> reopen_final_step
/// POST   /{id}/decision                 -> record_decision
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(track::get_track))
        .route(
            "/{id}/steps",
            post(track::add_step).put(track::restructure_steps),
        )
        .route(
            "/{id}/steps/{index}",
            put(track::update_step).delete(track::remove_step),
        )
        .route("/{id}/steps/{index}/status", put(track::set_step_status))
        .route(
            "/{id}/steps/{index}/images",
            post(track::upload_step_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
        .route(
            "/{id}/final",
            post(track::complete_final_step).delete(track::reopen_final_step),
        )
        .route("/{id}/decision", post(track::record_decision))
}
