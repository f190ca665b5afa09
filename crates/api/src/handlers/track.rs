//! Handlers for revision rounds ("tracks") and their steps.
//!
//! Every mutation loads the stored workflow, applies one operation from
//! [`TrackWorkflow`], and writes it back guarded by
//! `client_decision = 'pending'`; a guard miss means the client decided in
//! the meantime and is reported as a conflict.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use screener_core::error::CoreError;
use screener_core::roles::{can_decide, can_edit_tracks};
use screener_core::types::DbId;
use screener_core::workflow::{
    ClientDecision, DeliverableMediaType, StepDraft, StepStatus, TrackWorkflow,
};
use screener_db::models::track::ProjectTrack;
use screener_db::repositories::TrackRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::access::{ensure_project, ensure_track, require_project_role};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::uploads::{validate_image, ImageHostError};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RestructureRequest {
    pub steps: Vec<StepDraft>,
}

#[derive(Debug, Deserialize)]
pub struct StepStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteFinalRequest {
    pub deliverable_link: String,
    pub media_type: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
}

/// The decided track and, after a revision request, the new round.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub track: ProjectTrack,
    pub next_round: Option<ProjectTrack>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a track the caller may edit.
async fn editable_track(state: &AppState, auth: &AuthUser, track_id: DbId) -> AppResult<ProjectTrack> {
    let track = ensure_track(&state.pool, track_id).await?;
    let role = require_project_role(&state.pool, track.project_id, auth.user_id).await?;
    if !can_edit_tracks(&role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner or an editor can change steps".into(),
        )));
    }
    Ok(track)
}

/// Apply `op` to the stored workflow and persist the result.
async fn mutate_track<F>(
    state: &AppState,
    auth: &AuthUser,
    track_id: DbId,
    op: F,
) -> AppResult<Json<DataResponse<ProjectTrack>>>
where
    F: FnOnce(&mut TrackWorkflow) -> Result<(), CoreError>,
{
    let track = editable_track(state, auth, track_id).await?;
    let mut workflow = track.workflow()?;
    op(&mut workflow)?;

    let saved = TrackRepo::save_workflow(&state.pool, track.id, &workflow)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Track was decided while it was being edited".into(),
            ))
        })?;

    tracing::debug!(
        track_id,
        status = %saved.status,
        steps = workflow.steps.len(),
        "Track updated"
    );
    Ok(Json(DataResponse { data: saved }))
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/tracks
pub async fn list_tracks(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectTrack>>>> {
    ensure_project(&state.pool, project_id).await?;
    require_project_role(&state.pool, project_id, auth.user_id).await?;

    let tracks = TrackRepo::list_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: tracks }))
}

/// POST /api/v1/projects/{id}/tracks
///
/// Open the first round of a project. Later rounds are opened by a
/// revision request, so this fails while an undecided round exists.
pub async fn start_round(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectTrack>>)> {
    ensure_project(&state.pool, project_id).await?;
    let role = require_project_role(&state.pool, project_id, auth.user_id).await?;
    if !can_edit_tracks(&role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner or an editor can open a round".into(),
        )));
    }

    let existing = TrackRepo::list_for_project(&state.pool, project_id).await?;
    if existing
        .iter()
        .any(|t| t.client_decision == ClientDecision::Pending.as_str())
    {
        return Err(AppError::Core(CoreError::Conflict(
            "The project already has an open round".into(),
        )));
    }

    let track = TrackRepo::create_round(&state.pool, project_id, &TrackWorkflow::new()).await?;
    tracing::info!(
        project_id,
        track_id = track.id,
        round = track.round_number,
        "Round opened"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: track })))
}

/// GET /api/v1/tracks/{id}
pub async fn get_track(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    let track = ensure_track(&state.pool, track_id).await?;
    require_project_role(&state.pool, track.project_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: track }))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// POST /api/v1/tracks/{id}/steps
pub async fn add_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
    Json(draft): Json<StepDraft>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    mutate_track(&state, &auth, track_id, |wf| wf.add_step(&draft)).await
}

/// PUT /api/v1/tracks/{id}/steps
///
/// Replace every non-final step (reorder, merge, split).
pub async fn restructure_steps(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
    Json(input): Json<RestructureRequest>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    mutate_track(&state, &auth, track_id, |wf| wf.restructure_steps(&input.steps)).await
}

/// PUT /api/v1/tracks/{id}/steps/{index}
pub async fn update_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((track_id, index)): Path<(DbId, usize)>,
    Json(draft): Json<StepDraft>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    mutate_track(&state, &auth, track_id, |wf| wf.update_step(index, &draft)).await
}

/// DELETE /api/v1/tracks/{id}/steps/{index}
pub async fn remove_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((track_id, index)): Path<(DbId, usize)>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    mutate_track(&state, &auth, track_id, |wf| wf.remove_step(index)).await
}

/// PUT /api/v1/tracks/{id}/steps/{index}/status
pub async fn set_step_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((track_id, index)): Path<(DbId, usize)>,
    Json(input): Json<StepStatusRequest>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    let status: StepStatus = input.status.parse()?;
    mutate_track(&state, &auth, track_id, |wf| {
        wf.set_step_status(index, status, Utc::now())
    })
    .await
}

/// POST /api/v1/tracks/{id}/steps/{index}/images
///
/// Multipart upload with a single `file` field. The image is stored on the
/// external image host and its URL appended to the step.
pub async fn upload_step_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((track_id, index)): Path<(DbId, usize)>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    let image_host = state.image_host.clone().ok_or(ImageHostError::Disabled)?;

    // Fail before uploading when the step cannot take the image.
    let track = editable_track(&state, &auth, track_id).await?;
    let workflow = track.workflow()?;
    workflow.ensure_editable()?;
    if index >= workflow.steps.comment_steps().len() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Step index {index} out of range"
        ))));
    }

    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    validate_image(&content_type, data.len())?;

    let url = image_host.upload(&file_name, &content_type, data).await?;
    tracing::info!(track_id, index, %url, "Step image uploaded");

    mutate_track(&state, &auth, track_id, |wf| wf.attach_image(index, &url)).await
}

// ---------------------------------------------------------------------------
// Final step and decision
// ---------------------------------------------------------------------------

/// POST /api/v1/tracks/{id}/final
pub async fn complete_final_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
    Json(input): Json<CompleteFinalRequest>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    let media_type: DeliverableMediaType = input.media_type.parse()?;
    mutate_track(&state, &auth, track_id, |wf| {
        wf.complete_final_step(&input.deliverable_link, media_type, Utc::now())
    })
    .await
}

/// DELETE /api/v1/tracks/{id}/final
pub async fn reopen_final_step(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectTrack>>> {
    mutate_track(&state, &auth, track_id, |wf| wf.reopen_final_step()).await
}

/// POST /api/v1/tracks/{id}/decision
///
/// `revisions_requested` opens the next round in the same transaction.
pub async fn record_decision(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<DbId>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<DecisionResponse>>> {
    let decision: ClientDecision = input.decision.parse()?;

    let track = ensure_track(&state.pool, track_id).await?;
    let role = require_project_role(&state.pool, track.project_id, auth.user_id).await?;
    if !can_decide(&role) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner or a client can decide on a round".into(),
        )));
    }

    let mut workflow = track.workflow()?;
    let next_round = workflow.record_client_decision(decision)?;

    let (track, next_round) =
        TrackRepo::record_decision(&state.pool, track.id, decision, next_round.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(
                    "Track has already been decided or is not in review".into(),
                ))
            })?;

    tracing::info!(
        track_id = track.id,
        decision = %decision,
        next_round = next_round.as_ref().map(|t| t.round_number),
        "Client decision recorded"
    );

    Ok(Json(DataResponse {
        data: DecisionResponse { track, next_round },
    }))
}
