//! Repository for the `project_tracks` table.

use screener_core::types::DbId;
use screener_core::workflow::{ClientDecision, TrackWorkflow};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::track::ProjectTrack;

/// Column list shared across queries.
const COLUMNS: &str = "id, project_id, round_number, status, client_decision, steps, \
    final_deliverable_media_type, decided_at, created_at, updated_at";

fn steps_json(workflow: &TrackWorkflow) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(&workflow.steps).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Provides track queries.
pub struct TrackRepo;

impl TrackRepo {
    /// Start the next round for a project with the given workflow state.
    pub async fn create_round(
        pool: &PgPool,
        project_id: DbId,
        workflow: &TrackWorkflow,
    ) -> Result<ProjectTrack, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let track = Self::insert_next_round(&mut tx, project_id, workflow).await?;
        tx.commit().await?;
        Ok(track)
    }

    async fn insert_next_round(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        workflow: &TrackWorkflow,
    ) -> Result<ProjectTrack, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_tracks
                (project_id, round_number, status, client_decision, steps, final_deliverable_media_type)
             SELECT $1, COALESCE(MAX(round_number), 0) + 1, $2, $3, $4, $5
             FROM project_tracks WHERE project_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectTrack>(&query)
            .bind(project_id)
            .bind(workflow.status.as_str())
            .bind(workflow.client_decision.as_str())
            .bind(steps_json(workflow)?)
            .bind(workflow.media_type.map(|m| m.as_str()))
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a track by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectTrack>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_tracks WHERE id = $1");
        sqlx::query_as::<_, ProjectTrack>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All rounds of a project, oldest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectTrack>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_tracks WHERE project_id = $1 ORDER BY round_number"
        );
        sqlx::query_as::<_, ProjectTrack>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Persist an edited workflow while the decision is still pending.
    ///
    /// Returns `None` when the track is missing or has been decided in the
    /// meantime.
    pub async fn save_workflow(
        pool: &PgPool,
        id: DbId,
        workflow: &TrackWorkflow,
    ) -> Result<Option<ProjectTrack>, sqlx::Error> {
        let query = format!(
            "UPDATE project_tracks SET
                status = $2,
                steps = $3,
                final_deliverable_media_type = $4
             WHERE id = $1 AND client_decision = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectTrack>(&query)
            .bind(id)
            .bind(workflow.status.as_str())
            .bind(steps_json(workflow)?)
            .bind(workflow.media_type.map(|m| m.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Record the client decision and, if given, open the next round.
    ///
    /// Both writes share one transaction. Returns `None` when the track was
    /// already decided.
    pub async fn record_decision(
        pool: &PgPool,
        id: DbId,
        decision: ClientDecision,
        next_round: Option<&TrackWorkflow>,
    ) -> Result<Option<(ProjectTrack, Option<ProjectTrack>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE project_tracks SET client_decision = $2, decided_at = NOW()
             WHERE id = $1 AND client_decision = 'pending' AND status = 'in_review'
             RETURNING {COLUMNS}"
        );
        let decided = sqlx::query_as::<_, ProjectTrack>(&query)
            .bind(id)
            .bind(decision.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(decided) = decided else {
            return Ok(None);
        };

        let next = match next_round {
            Some(workflow) => {
                Some(Self::insert_next_round(&mut tx, decided.project_id, workflow).await?)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(Some((decided, next)))
    }
}
