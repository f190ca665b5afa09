//! Lookups shared by handlers: load-or-404 and project permission checks.

use screener_core::error::CoreError;
use screener_core::types::DbId;
use screener_db::models::media::Media;
use screener_db::models::project::Project;
use screener_db::models::track::ProjectTrack;
use screener_db::repositories::{MediaRepo, ProjectRepo, TrackRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

pub async fn ensure_project(pool: &PgPool, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        })
    })
}

pub async fn ensure_media(pool: &PgPool, id: DbId) -> AppResult<Media> {
    MediaRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Media", id }))
}

pub async fn ensure_track(pool: &PgPool, id: DbId) -> AppResult<ProjectTrack> {
    TrackRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "Track", id }))
}

/// The caller's role on a project (`"owner"` or a member role).
///
/// Returns 403 when the user is neither the owner nor an accepted member.
pub async fn require_project_role(
    pool: &PgPool,
    project_id: DbId,
    user_id: DbId,
) -> AppResult<String> {
    ProjectRepo::access_role(pool, project_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "You do not have access to this project".into(),
            ))
        })
}

/// Only the owner may manage invitations and review links.
pub fn require_owner(project: &Project, user_id: DbId) -> AppResult<()> {
    if project.owner_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner can do this".into(),
        )));
    }
    Ok(())
}
