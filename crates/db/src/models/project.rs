//! Project, membership and invitation models.

use screener_core::recipients::ProjectPerson;
use screener_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<Timestamp>,
    pub status: String,
    pub client_name: Option<String>,
    pub is_password_protected: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<Timestamp>,
    pub client_name: Option<String>,
}

/// A member joined with their user account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberWithUser {
    pub user_id: DbId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: Timestamp,
}

/// The owner or a member, as needed by the recipient resolver.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectPersonRow {
    pub user_id: DbId,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<ProjectPersonRow> for ProjectPerson {
    fn from(row: ProjectPersonRow) -> Self {
        ProjectPerson {
            user_id: row.user_id,
            email: Some(row.email),
            display_name: row.display_name,
        }
    }
}

/// A row from the `project_invitations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectInvitation {
    pub id: DbId,
    pub project_id: DbId,
    pub email: String,
    pub role: String,
    /// Only ever sent to the invitee.
    #[serde(skip_serializing)]
    pub token: String,
    pub invited_by: DbId,
    pub expires_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inviting someone to a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvitation {
    pub email: String,
    pub role: String,
}
