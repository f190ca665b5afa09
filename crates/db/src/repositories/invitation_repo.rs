//! Repository for the `project_invitations` table.

use screener_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::project::ProjectInvitation;

/// Column list shared across queries.
const COLUMNS: &str = "id, project_id, email, role, token, invited_by, expires_at, \
    accepted_at, created_at, updated_at";

/// Provides invitation queries.
pub struct InvitationRepo;

impl InvitationRepo {
    /// Insert a new invitation.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        email: &str,
        role: &str,
        token: &str,
        invited_by: DbId,
        expires_at: Timestamp,
    ) -> Result<ProjectInvitation, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_invitations (project_id, email, role, token, invited_by, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectInvitation>(&query)
            .bind(project_id)
            .bind(email)
            .bind(role)
            .bind(token)
            .bind(invited_by)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find an invitation by its token.
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ProjectInvitation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_invitations WHERE token = $1");
        sqlx::query_as::<_, ProjectInvitation>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Mark the invitation used and create the membership in one transaction.
    ///
    /// Returns `false` if the invitation was accepted concurrently.
    pub async fn accept(
        pool: &PgPool,
        invitation: &ProjectInvitation,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE project_invitations SET accepted_at = NOW()
             WHERE id = $1 AND accepted_at IS NULL",
        )
        .bind(invitation.id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_project_members_project_user
             DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(invitation.project_id)
        .bind(user_id)
        .bind(&invitation.role)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
