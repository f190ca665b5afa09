//! Repository for the `projects` and `project_members` tables.

use screener_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, MemberWithUser, Project, ProjectPersonRow};

/// Column list shared across queries.
const COLUMNS: &str = "id, owner_id, title, description, deadline, status, client_name, \
    is_password_protected, created_at, updated_at";

/// Provides project and membership queries.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (owner_id, title, description, deadline, client_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.deadline)
            .bind(&input.client_name)
            .fetch_one(pool)
            .await
    }

    /// Find a project by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// `true` when the user owns the project or is an accepted member.
    pub async fn has_access(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM projects WHERE id = $1 AND owner_id = $2
                UNION ALL
                SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// The caller's role on the project: `"owner"` for the owner, the member
    /// role for accepted members, `None` without access.
    pub async fn access_role(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT 'owner'::text FROM projects WHERE id = $1 AND owner_id = $2
             UNION ALL
             SELECT role FROM project_members WHERE project_id = $1 AND user_id = $2
             LIMIT 1",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The project owner's account details.
    pub async fn find_owner(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<ProjectPersonRow>, sqlx::Error> {
        sqlx::query_as::<_, ProjectPersonRow>(
            "SELECT u.id AS user_id, u.email, u.display_name
             FROM projects p
             JOIN users u ON u.id = p.owner_id
             WHERE p.id = $1",
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Accepted members, oldest first. The owner is not included.
    pub async fn list_members(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        sqlx::query_as::<_, MemberWithUser>(
            "SELECT m.user_id, u.email, u.display_name, m.role, m.created_at
             FROM project_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.project_id = $1
             ORDER BY m.created_at, m.id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Add a member directly. Existing memberships are left unchanged.
    ///
    /// Returns `true` if a new membership row was created.
    pub async fn add_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        role: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_project_members_project_user DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
