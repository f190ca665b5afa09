//! Revision-round track model.

use screener_core::error::CoreError;
use screener_core::types::{DbId, Timestamp};
use screener_core::workflow::{StepList, TrackWorkflow};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `project_tracks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectTrack {
    pub id: DbId,
    pub project_id: DbId,
    pub round_number: i32,
    pub status: String,
    pub client_decision: String,
    /// JSON array; see [`StepList`].
    pub steps: serde_json::Value,
    pub final_deliverable_media_type: Option<String>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectTrack {
    /// Parse the stored columns into the typed workflow.
    pub fn workflow(&self) -> Result<TrackWorkflow, CoreError> {
        Ok(TrackWorkflow {
            status: self.status.parse()?,
            client_decision: self.client_decision.parse()?,
            steps: StepList::from_json(&self.steps)?,
            media_type: self
                .final_deliverable_media_type
                .as_deref()
                .map(str::parse)
                .transpose()?,
        })
    }
}
