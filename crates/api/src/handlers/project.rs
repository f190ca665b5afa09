//! Handlers for project membership, invitations, and the per-project
//! notification toggle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use screener_core::error::CoreError;
use screener_core::invitation::{
    check_acceptance, default_expiry, generate_invitation_token, validate_invitee_email,
    InvitationState,
};
use screener_core::roles::validate_member_role;
use screener_core::types::DbId;
use screener_db::models::notification::{
    ProjectNotificationSetting, UpdateProjectNotificationSetting,
};
use screener_db::models::project::{CreateInvitation, MemberWithUser, ProjectInvitation};
use screener_db::repositories::{
    InvitationRepo, NotificationPreferenceRepo, ProjectRepo, UserRepo,
};
use screener_events::{templates, InvitationAccepted};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::access::{ensure_project, require_owner, require_project_role};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// The owner plus accepted members of a project.
#[derive(Debug, Serialize)]
pub struct ProjectPeople {
    pub owner: OwnerInfo,
    pub members: Vec<MemberWithUser>,
}

#[derive(Debug, Serialize)]
pub struct OwnerInfo {
    pub user_id: DbId,
    pub email: String,
    pub display_name: Option<String>,
}

/// GET /api/v1/projects/{id}/members
pub async fn list_members(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectPeople>>> {
    ensure_project(&state.pool, project_id).await?;
    require_project_role(&state.pool, project_id, auth.user_id).await?;

    let owner = ProjectRepo::find_owner(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Project {project_id} has no owner")))?;
    let members = ProjectRepo::list_members(&state.pool, project_id).await?;

    Ok(Json(DataResponse {
        data: ProjectPeople {
            owner: OwnerInfo {
                user_id: owner.user_id,
                email: owner.email,
                display_name: owner.display_name,
            },
            members,
        },
    }))
}

/// PUT /api/v1/projects/{id}/notifications
///
/// Turn all notifications for this project on or off for the caller.
pub async fn update_notification_setting(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<UpdateProjectNotificationSetting>,
) -> AppResult<Json<DataResponse<ProjectNotificationSetting>>> {
    ensure_project(&state.pool, project_id).await?;
    require_project_role(&state.pool, project_id, auth.user_id).await?;

    let setting = NotificationPreferenceRepo::set_project_enabled(
        &state.pool,
        project_id,
        auth.user_id,
        input.enabled,
    )
    .await?;

    Ok(Json(DataResponse { data: setting }))
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/invitations
///
/// Owner-only. Creates the invitation and emails the token link to the
/// invitee. A failed email does not fail the request.
pub async fn create_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateInvitation>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectInvitation>>)> {
    let project = ensure_project(&state.pool, project_id).await?;
    require_owner(&project, auth.user_id)?;

    let email = validate_invitee_email(&input.email)?;
    validate_member_role(&input.role)?;

    let token = generate_invitation_token();
    let invitation = InvitationRepo::create(
        &state.pool,
        project_id,
        &email,
        &input.role,
        &token,
        auth.user_id,
        default_expiry(Utc::now()),
    )
    .await?;

    tracing::info!(
        project_id,
        invitation_id = invitation.id,
        role = %invitation.role,
        "Invitation created"
    );

    if let Some(mailer) = &state.mailer {
        let inviter = UserRepo::find_by_id(&state.pool, auth.user_id).await?;
        let inviter_name = inviter.as_ref().map(|u| u.public_name()).unwrap_or("A colleague");
        let message = templates::invitation_email(
            &invitation.email,
            inviter_name,
            &project.title,
            &invitation.role,
            &state.config.app_url(&format!("/invitations/{token}")),
        );
        if let Err(e) = mailer.send(&message).await {
            tracing::warn!(invitation_id = invitation.id, error = %e, "Failed to send invitation email");
        }
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: invitation })))
}

/// POST /api/v1/invitations/{token}/accept
///
/// The signed-in user must own the invited email address.
pub async fn accept_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<ProjectInvitation>>> {
    let invitation = InvitationRepo::find_by_token(&state.pool, &token)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".into()))?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    check_acceptance(
        &InvitationState {
            email: &invitation.email,
            expires_at: invitation.expires_at,
            accepted_at: invitation.accepted_at,
        },
        &user.email,
        Utc::now(),
    )?;

    if !InvitationRepo::accept(&state.pool, &invitation, user.id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Invitation has already been used".into(),
        )));
    }

    tracing::info!(
        project_id = invitation.project_id,
        user_id = user.id,
        "Invitation accepted"
    );

    state.event_bus.publish(
        InvitationAccepted {
            invitation_id: invitation.id,
            project_id: invitation.project_id,
            member_user_id: user.id,
        }
        .into_event(),
    );

    let accepted = InvitationRepo::find_by_token(&state.pool, &token)
        .await?
        .unwrap_or(invitation);
    Ok(Json(DataResponse { data: accepted }))
}
