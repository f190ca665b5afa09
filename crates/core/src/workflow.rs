//! Revision-round step workflow.
//!
//! A project is worked on in rounds ("tracks"). Each track holds an ordered
//! list of comment steps followed by exactly one final "Finish" step that
//! carries the deliverable link. [`StepList`] enforces that shape by
//! construction and is stored as a JSON array in `project_tracks.steps`.
//!
//! Track lifecycle:
//!
//! ```text
//! in_progress ──(every step completed, deliverable attached)──> in_review
//! in_review   ──(client approves)──────────────────────────────> approved
//! in_review   ──(client requests revisions)──> revisions_requested + round n+1
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::links::{encode_links, unresolved_placeholder};
use crate::types::Timestamp;

/// Name given to the final step of every track.
pub const FINAL_STEP_NAME: &str = "Finish";

/// `metadata.type` value for steps created from review comments.
pub const COMMENT_STEP_TYPE: &str = "comment";

/// Maximum length of a step's text.
pub const MAX_STEP_TEXT_LENGTH: usize = 10_000;

/// Maximum number of non-final steps in one track.
pub const MAX_STEPS_PER_TRACK: usize = 200;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            /// Database / wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $value ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $value => Ok(Self::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        concat!("Invalid ", $label, " '{}'. Must be one of: {}"),
                        s,
                        [$( $value ),+].join(", ")
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// Completion status of one step.
    StepStatus, "step status" {
        Pending => "pending",
        Completed => "completed",
    }
}

string_enum! {
    /// Editor-side status of a track.
    TrackStatus, "track status" {
        InProgress => "in_progress",
        InReview => "in_review",
    }
}

string_enum! {
    /// Client verdict on a track that is in review.
    ClientDecision, "client decision" {
        Pending => "pending",
        Approved => "approved",
        RevisionsRequested => "revisions_requested",
    }
}

string_enum! {
    /// Kind of file delivered by the final step.
    DeliverableMediaType, "media type" {
        Video => "video",
        Image => "image",
        Audio => "audio",
        Document => "document",
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Content of a comment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    /// Text with URLs replaced by `[LINK:n]` placeholders.
    pub text: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Position in the media, in seconds.
    #[serde(default)]
    pub timestamp: Option<f64>,
    /// Stable key that survives reordering and restructuring.
    pub comment_id: String,
}

/// A non-final step.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentStep {
    pub name: String,
    pub status: StepStatus,
    pub completed_at: Option<Timestamp>,
    pub metadata: StepMetadata,
}

/// The final "Finish" step.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalStep {
    pub name: String,
    pub status: StepStatus,
    pub deliverable_link: Option<String>,
    pub completed_at: Option<Timestamp>,
}

impl Default for FinalStep {
    fn default() -> Self {
        Self {
            name: FINAL_STEP_NAME.to_string(),
            status: StepStatus::Pending,
            deliverable_link: None,
            completed_at: None,
        }
    }
}

/// Editor input describing a comment step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepDraft {
    pub name: Option<String>,
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub timestamp: Option<f64>,
    /// Key of an existing step (or source comment) to carry state from.
    pub comment_id: Option<String>,
}

/// Serialized form of one element of the `steps` JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StepRecord {
    name: String,
    status: StepStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_final: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deliverable_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<StepMetadata>,
}

/// Ordered steps of a track: comment steps, then exactly one final step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<StepRecord>", into = "Vec<StepRecord>")]
pub struct StepList {
    steps: Vec<CommentStep>,
    final_step: FinalStep,
}

impl TryFrom<Vec<StepRecord>> for StepList {
    type Error = String;

    fn try_from(mut records: Vec<StepRecord>) -> Result<Self, Self::Error> {
        let last = records
            .pop()
            .ok_or_else(|| "steps must contain the final step".to_string())?;
        if !last.is_final {
            return Err("the last step must be the final step".to_string());
        }

        let mut steps = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            if record.is_final {
                return Err(format!("step {i} is marked final but is not last"));
            }
            let metadata = record
                .metadata
                .ok_or_else(|| format!("step {i} is missing metadata"))?;
            steps.push(CommentStep {
                name: record.name,
                status: record.status,
                completed_at: record.completed_at,
                metadata,
            });
        }

        Ok(Self {
            steps,
            final_step: FinalStep {
                name: last.name,
                status: last.status,
                deliverable_link: last.deliverable_link,
                completed_at: last.completed_at,
            },
        })
    }
}

impl From<StepList> for Vec<StepRecord> {
    fn from(list: StepList) -> Self {
        let mut records: Vec<StepRecord> = list
            .steps
            .into_iter()
            .map(|s| StepRecord {
                name: s.name,
                status: s.status,
                is_final: false,
                deliverable_link: None,
                completed_at: s.completed_at,
                metadata: Some(s.metadata),
            })
            .collect();
        records.push(StepRecord {
            name: list.final_step.name,
            status: list.final_step.status,
            is_final: true,
            deliverable_link: list.final_step.deliverable_link,
            completed_at: list.final_step.completed_at,
            metadata: None,
        });
        records
    }
}

impl StepList {
    /// A list holding only the final step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored JSON array.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid steps document: {e}")))
    }

    pub fn comment_steps(&self) -> &[CommentStep] {
        &self.steps
    }

    pub fn final_step(&self) -> &FinalStep {
        &self.final_step
    }

    /// Total number of steps, final step included.
    pub fn len(&self) -> usize {
        self.steps.len() + 1
    }

    /// Always `false`: the final step is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `true` when every step, final step included, is completed.
    pub fn all_completed(&self) -> bool {
        self.final_step.status == StepStatus::Completed
            && self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut CommentStep, CoreError> {
        let count = self.steps.len();
        self.steps.get_mut(index).ok_or_else(|| {
            if index == count {
                CoreError::Validation(
                    "The final step can only be changed through the deliverable endpoints"
                        .to_string(),
                )
            } else {
                CoreError::Validation(format!(
                    "Step index {index} out of range (track has {count} editable steps)"
                ))
            }
        })
    }

    /// Reset every step to pending and clear the deliverable link.
    fn reset(&mut self) {
        for step in &mut self.steps {
            step.status = StepStatus::Pending;
            step.completed_at = None;
        }
        self.final_step.status = StepStatus::Pending;
        self.final_step.completed_at = None;
        self.final_step.deliverable_link = None;
    }
}

/// Build step metadata from a draft, encoding links in the text.
fn build_metadata(draft: &StepDraft, previous_links: &[String]) -> Result<StepMetadata, CoreError> {
    if draft.text.trim().is_empty() && draft.images.is_empty() {
        return Err(CoreError::Validation(
            "A step must have text or at least one image".to_string(),
        ));
    }
    if draft.text.chars().count() > MAX_STEP_TEXT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Step text exceeds maximum length of {MAX_STEP_TEXT_LENGTH} characters"
        )));
    }
    if let Some(ts) = draft.timestamp {
        if !ts.is_finite() || ts < 0.0 {
            return Err(CoreError::Validation(
                "Step timestamp must be a non-negative number of seconds".to_string(),
            ));
        }
    }

    if let Some(marker) = unresolved_placeholder(&draft.text, previous_links) {
        return Err(CoreError::Validation(format!(
            "Step text contains {marker}, which does not refer to a link of this step"
        )));
    }

    let linked = encode_links(&draft.text, previous_links);
    Ok(StepMetadata {
        kind: COMMENT_STEP_TYPE.to_string(),
        text: linked.text,
        links: linked.links,
        images: draft.images.clone(),
        timestamp: draft.timestamp,
        comment_id: draft
            .comment_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    })
}

fn validate_deliverable_link(link: &str) -> Result<String, CoreError> {
    let link = link.trim();
    if !(link.starts_with("https://") || link.starts_with("http://")) || link.ends_with("://") {
        return Err(CoreError::Validation(
            "Deliverable link must be an http(s) URL".to_string(),
        ));
    }
    Ok(link.to_string())
}

// ---------------------------------------------------------------------------
// Track workflow
// ---------------------------------------------------------------------------

/// Mutable workflow state of one track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackWorkflow {
    pub status: TrackStatus,
    pub client_decision: ClientDecision,
    pub steps: StepList,
    pub media_type: Option<DeliverableMediaType>,
}

impl Default for TrackWorkflow {
    fn default() -> Self {
        Self {
            status: TrackStatus::InProgress,
            client_decision: ClientDecision::Pending,
            steps: StepList::new(),
            media_type: None,
        }
    }
}

impl TrackWorkflow {
    /// A fresh round: only the final step, in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject edits once the client has decided.
    pub fn ensure_editable(&self) -> Result<(), CoreError> {
        if self.client_decision != ClientDecision::Pending {
            return Err(CoreError::Conflict(format!(
                "Track is locked: client decision is already '{}'",
                self.client_decision
            )));
        }
        Ok(())
    }

    /// `true` when every step is completed and the deliverable is attached.
    pub fn is_ready_for_review(&self) -> bool {
        self.steps.all_completed()
            && self.steps.final_step.deliverable_link.is_some()
            && self.media_type.is_some()
    }

    fn refresh_status(&mut self) {
        self.status = if self.is_ready_for_review() {
            TrackStatus::InReview
        } else {
            TrackStatus::InProgress
        };
    }

    /// Append a comment step just before the final step.
    pub fn add_step(&mut self, draft: &StepDraft) -> Result<(), CoreError> {
        self.ensure_editable()?;
        if self.steps.steps.len() >= MAX_STEPS_PER_TRACK {
            return Err(CoreError::Validation(format!(
                "A track may have at most {MAX_STEPS_PER_TRACK} steps"
            )));
        }
        let metadata = build_metadata(draft, &[])?;
        let position = self.steps.steps.len();
        self.steps.steps.push(CommentStep {
            name: step_name(draft, position),
            status: StepStatus::Pending,
            completed_at: None,
            metadata,
        });
        self.refresh_status();
        Ok(())
    }

    /// Rewrite the content of a non-final step, keeping its status.
    pub fn update_step(&mut self, index: usize, draft: &StepDraft) -> Result<(), CoreError> {
        self.ensure_editable()?;
        let step = self.steps.step_mut(index)?;
        let mut metadata = build_metadata(draft, &step.metadata.links)?;
        metadata.comment_id = step.metadata.comment_id.clone();
        if let Some(name) = draft.name.as_deref().filter(|n| !n.trim().is_empty()) {
            step.name = name.trim().to_string();
        }
        step.metadata = metadata;
        Ok(())
    }

    /// Append a hosted image URL to a non-final step.
    pub fn attach_image(&mut self, index: usize, url: &str) -> Result<(), CoreError> {
        self.ensure_editable()?;
        let step = self.steps.step_mut(index)?;
        step.metadata.images.push(url.to_string());
        Ok(())
    }

    /// Remove a non-final step.
    pub fn remove_step(&mut self, index: usize) -> Result<(), CoreError> {
        self.ensure_editable()?;
        self.steps.step_mut(index)?;
        self.steps.steps.remove(index);
        self.refresh_status();
        Ok(())
    }

    /// Replace all non-final steps.
    ///
    /// Drafts whose `comment_id` matches an existing step keep that step's
    /// status and completion time; every other draft starts pending.
    pub fn restructure_steps(&mut self, drafts: &[StepDraft]) -> Result<(), CoreError> {
        self.ensure_editable()?;
        if drafts.len() > MAX_STEPS_PER_TRACK {
            return Err(CoreError::Validation(format!(
                "A track may have at most {MAX_STEPS_PER_TRACK} steps"
            )));
        }

        let mut rebuilt = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.iter().enumerate() {
            let previous = draft
                .comment_id
                .as_deref()
                .and_then(|id| self.steps.steps.iter().find(|s| s.metadata.comment_id == id));

            let previous_links = previous.map(|p| p.metadata.links.as_slice()).unwrap_or(&[]);
            let metadata = build_metadata(draft, previous_links)?;

            if rebuilt
                .iter()
                .any(|s: &CommentStep| s.metadata.comment_id == metadata.comment_id)
            {
                return Err(CoreError::Validation(format!(
                    "Duplicate step comment_id '{}'",
                    metadata.comment_id
                )));
            }

            let (status, completed_at) = previous
                .map(|p| (p.status, p.completed_at))
                .unwrap_or((StepStatus::Pending, None));
            rebuilt.push(CommentStep {
                name: step_name(draft, position),
                status,
                completed_at,
                metadata,
            });
        }

        self.steps.steps = rebuilt;
        self.refresh_status();
        Ok(())
    }

    /// Mark a non-final step pending or completed.
    pub fn set_step_status(
        &mut self,
        index: usize,
        status: StepStatus,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        self.ensure_editable()?;
        let step = self.steps.step_mut(index)?;
        step.status = status;
        step.completed_at = match status {
            StepStatus::Completed => step.completed_at.or(Some(now)),
            StepStatus::Pending => None,
        };
        self.refresh_status();
        Ok(())
    }

    /// Complete the final step with a deliverable link and media type.
    pub fn complete_final_step(
        &mut self,
        deliverable_link: &str,
        media_type: DeliverableMediaType,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        self.ensure_editable()?;
        let link = validate_deliverable_link(deliverable_link)?;
        let final_step = &mut self.steps.final_step;
        final_step.deliverable_link = Some(link);
        final_step.status = StepStatus::Completed;
        final_step.completed_at = Some(now);
        self.media_type = Some(media_type);
        self.refresh_status();
        Ok(())
    }

    /// Put the final step back to pending, keeping its link for editing.
    pub fn reopen_final_step(&mut self) -> Result<(), CoreError> {
        self.ensure_editable()?;
        self.steps.final_step.status = StepStatus::Pending;
        self.steps.final_step.completed_at = None;
        self.refresh_status();
        Ok(())
    }

    /// Record the client's verdict on a track in review.
    ///
    /// Returns the workflow of the next round when revisions are requested.
    pub fn record_client_decision(
        &mut self,
        decision: ClientDecision,
    ) -> Result<Option<TrackWorkflow>, CoreError> {
        if decision == ClientDecision::Pending {
            return Err(CoreError::Validation(
                "Decision must be 'approved' or 'revisions_requested'".to_string(),
            ));
        }
        self.ensure_editable()?;
        if self.status != TrackStatus::InReview {
            return Err(CoreError::Conflict(
                "Track is not in review yet".to_string(),
            ));
        }

        self.client_decision = decision;
        match decision {
            ClientDecision::RevisionsRequested => Ok(Some(self.next_round())),
            _ => Ok(None),
        }
    }

    /// Workflow for the following round: same structure, everything pending.
    pub fn next_round(&self) -> TrackWorkflow {
        let mut steps = self.steps.clone();
        steps.reset();
        TrackWorkflow {
            status: TrackStatus::InProgress,
            client_decision: ClientDecision::Pending,
            steps,
            media_type: None,
        }
    }
}

fn step_name(draft: &StepDraft, position: usize) -> String {
    draft
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Step {}", position + 1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn draft(text: &str, id: Option<&str>) -> StepDraft {
        StepDraft {
            text: text.to_string(),
            comment_id: id.map(str::to_string),
            ..StepDraft::default()
        }
    }

    #[test]
    fn attach_image_appends_to_step() {
        let mut wf = TrackWorkflow::new();
        wf.add_step(&draft("see frame", Some("c0"))).unwrap();
        wf.attach_image(0, "https://img.example/a.png").unwrap();
        assert_eq!(
            wf.steps.comment_steps()[0].metadata.images,
            vec!["https://img.example/a.png".to_string()]
        );
        assert_matches!(
            wf.attach_image(1, "https://img.example/b.png"),
            Err(CoreError::Validation(msg)) if msg.contains("final step")
        );
    }

    fn workflow_with_steps(n: usize) -> TrackWorkflow {
        let mut wf = TrackWorkflow::new();
        for i in 0..n {
            wf.add_step(&draft(&format!("fix {i}"), Some(&format!("c{i}"))))
                .unwrap();
        }
        wf
    }

    fn complete_everything(wf: &mut TrackWorkflow) {
        for i in 0..wf.steps.comment_steps().len() {
            wf.set_step_status(i, StepStatus::Completed, now()).unwrap();
        }
        wf.complete_final_step("https://cdn.example/final.mp4", DeliverableMediaType::Video, now())
            .unwrap();
    }

    #[test]
    fn new_track_has_only_final_step() {
        let wf = TrackWorkflow::new();
        assert_eq!(wf.steps.len(), 1);
        assert_eq!(wf.steps.final_step().name, FINAL_STEP_NAME);
        assert_eq!(wf.status, TrackStatus::InProgress);
    }

    #[test]
    fn steps_serialize_with_final_last() {
        let wf = workflow_with_steps(2);
        let json = serde_json::to_value(&wf.steps).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[2]["is_final"], true);
        assert!(arr[0].get("is_final").is_none());
        assert_eq!(arr[0]["metadata"]["comment_id"], "c0");

        let parsed = StepList::from_json(&json).unwrap();
        assert_eq!(parsed, wf.steps);
    }

    #[test]
    fn steps_without_trailing_final_rejected() {
        let json = serde_json::json!([
            { "name": "Finish", "status": "pending", "is_final": true },
            { "name": "x", "status": "pending",
              "metadata": { "type": "comment", "text": "t", "comment_id": "a" } }
        ]);
        assert_matches!(StepList::from_json(&json), Err(CoreError::Validation(_)));
        assert_matches!(
            StepList::from_json(&serde_json::json!([])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn add_step_encodes_links() {
        let mut wf = TrackWorkflow::new();
        wf.add_step(&draft("Swap logo, see https://brand.example/logo.png", None))
            .unwrap();
        let step = &wf.steps.comment_steps()[0];
        assert_eq!(step.metadata.text, "Swap logo, see [LINK:0]");
        assert_eq!(step.metadata.links, vec!["https://brand.example/logo.png".to_string()]);
        assert!(!step.metadata.comment_id.is_empty());
        assert_eq!(step.name, "Step 1");
    }

    #[test]
    fn empty_step_rejected() {
        let mut wf = TrackWorkflow::new();
        assert_matches!(wf.add_step(&draft("   ", None)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn literal_placeholder_without_link_rejected() {
        let mut wf = TrackWorkflow::new();
        assert_matches!(
            wf.add_step(&draft("typed [LINK:0] then https://a.example", None)),
            Err(CoreError::Validation(msg)) if msg.contains("[LINK:0]")
        );

        // Placeholders from the step's own encoding still resolve on edit.
        wf.add_step(&draft("see https://a.example", Some("c0"))).unwrap();
        let stored = wf.steps.comment_steps()[0].metadata.text.clone();
        wf.update_step(0, &draft(&format!("{stored} and https://b.example"), Some("c0")))
            .unwrap();
        let step = &wf.steps.comment_steps()[0];
        assert_eq!(step.metadata.text, "see [LINK:0] and [LINK:1]");
        assert_eq!(step.metadata.links.len(), 2);
    }

    #[test]
    fn step_text_limit_counts_characters() {
        let mut wf = TrackWorkflow::new();
        // Two bytes per character: over the limit in bytes, at it in chars.
        let at_limit = "é".repeat(MAX_STEP_TEXT_LENGTH);
        assert!(wf.add_step(&draft(&at_limit, None)).is_ok());

        let over = "é".repeat(MAX_STEP_TEXT_LENGTH + 1);
        assert_matches!(
            wf.add_step(&draft(&over, None)),
            Err(CoreError::Validation(msg)) if msg.contains("maximum length")
        );
    }

    #[test]
    fn in_review_requires_everything_completed() {
        let mut wf = workflow_with_steps(2);
        wf.set_step_status(0, StepStatus::Completed, now()).unwrap();
        wf.complete_final_step("https://cdn.example/v.mp4", DeliverableMediaType::Video, now())
            .unwrap();
        assert_eq!(wf.status, TrackStatus::InProgress);

        wf.set_step_status(1, StepStatus::Completed, now()).unwrap();
        assert_eq!(wf.status, TrackStatus::InReview);

        wf.set_step_status(1, StepStatus::Pending, now()).unwrap();
        assert_eq!(wf.status, TrackStatus::InProgress);
    }

    #[test]
    fn final_step_requires_http_link() {
        let mut wf = TrackWorkflow::new();
        assert_matches!(
            wf.complete_final_step("ftp://x", DeliverableMediaType::Video, now()),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            wf.complete_final_step("  ", DeliverableMediaType::Video, now()),
            Err(CoreError::Validation(_))
        );
        assert_eq!(wf.steps.final_step().status, StepStatus::Pending);
    }

    #[test]
    fn final_step_not_addressable_by_index() {
        let mut wf = workflow_with_steps(1);
        assert_matches!(
            wf.set_step_status(1, StepStatus::Completed, now()),
            Err(CoreError::Validation(msg)) if msg.contains("final step")
        );
        assert_matches!(wf.remove_step(5), Err(CoreError::Validation(_)));
    }

    #[test]
    fn restructure_preserves_state_by_comment_id() {
        let mut wf = workflow_with_steps(3);
        wf.set_step_status(1, StepStatus::Completed, now()).unwrap();

        wf.restructure_steps(&[
            draft("fix 1 reworded", Some("c1")),
            draft("brand new", None),
            draft("fix 0", Some("c0")),
        ])
        .unwrap();

        let steps = wf.steps.comment_steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].metadata.comment_id, "c1");
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert_eq!(steps[0].completed_at, Some(now()));
        assert_eq!(steps[1].status, StepStatus::Pending);
        assert_eq!(steps[2].status, StepStatus::Pending);
        assert_eq!(wf.steps.final_step().name, FINAL_STEP_NAME);
    }

    #[test]
    fn restructure_rejects_duplicate_ids() {
        let mut wf = workflow_with_steps(1);
        let result = wf.restructure_steps(&[draft("a", Some("c0")), draft("b", Some("c0"))]);
        assert_matches!(result, Err(CoreError::Validation(_)));
        assert_eq!(wf.steps.comment_steps().len(), 1);
    }

    #[test]
    fn update_step_keeps_comment_id_and_status() {
        let mut wf = workflow_with_steps(1);
        wf.set_step_status(0, StepStatus::Completed, now()).unwrap();
        let mut edit = draft("new text https://a.example", Some("ignored"));
        edit.name = Some("Renamed".into());
        wf.update_step(0, &edit).unwrap();

        let step = &wf.steps.comment_steps()[0];
        assert_eq!(step.metadata.comment_id, "c0");
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.name, "Renamed");
        assert_eq!(step.metadata.text, "new text [LINK:0]");
    }

    #[test]
    fn edits_rejected_after_client_decision() {
        let mut wf = workflow_with_steps(1);
        complete_everything(&mut wf);
        wf.record_client_decision(ClientDecision::Approved).unwrap();

        assert_matches!(
            wf.restructure_steps(&[draft("x", None)]),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(wf.add_step(&draft("x", None)), Err(CoreError::Conflict(_)));
        assert_matches!(wf.remove_step(0), Err(CoreError::Conflict(_)));
        assert_matches!(wf.reopen_final_step(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn decision_requires_in_review() {
        let mut wf = workflow_with_steps(1);
        assert_matches!(
            wf.record_client_decision(ClientDecision::Approved),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            wf.record_client_decision(ClientDecision::Pending),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn revisions_requested_spawns_reset_round() {
        let mut wf = workflow_with_steps(2);
        complete_everything(&mut wf);
        assert_eq!(wf.status, TrackStatus::InReview);

        let next = wf
            .record_client_decision(ClientDecision::RevisionsRequested)
            .unwrap()
            .expect("next round");

        assert_eq!(wf.client_decision, ClientDecision::RevisionsRequested);
        assert_eq!(next.status, TrackStatus::InProgress);
        assert_eq!(next.client_decision, ClientDecision::Pending);
        assert_eq!(next.media_type, None);
        assert_eq!(next.steps.comment_steps().len(), 2);
        assert!(next
            .steps
            .comment_steps()
            .iter()
            .all(|s| s.status == StepStatus::Pending && s.completed_at.is_none()));
        assert_eq!(next.steps.final_step().deliverable_link, None);
        assert_eq!(
            next.steps.comment_steps()[1].metadata.comment_id,
            wf.steps.comment_steps()[1].metadata.comment_id
        );
    }

    #[test]
    fn approval_has_no_next_round() {
        let mut wf = workflow_with_steps(0);
        complete_everything(&mut wf);
        assert_eq!(wf.record_client_decision(ClientDecision::Approved).unwrap(), None);
        assert_matches!(
            wf.record_client_decision(ClientDecision::RevisionsRequested),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn reopening_final_step_leaves_review() {
        let mut wf = workflow_with_steps(0);
        complete_everything(&mut wf);
        wf.reopen_final_step().unwrap();
        assert_eq!(wf.status, TrackStatus::InProgress);
        assert!(wf.steps.final_step().deliverable_link.is_some());
    }

    #[test]
    fn enum_parsing() {
        assert_eq!("in_review".parse::<TrackStatus>().unwrap(), TrackStatus::InReview);
        assert_eq!(
            "revisions_requested".parse::<ClientDecision>().unwrap(),
            ClientDecision::RevisionsRequested
        );
        assert_matches!("gif".parse::<DeliverableMediaType>(), Err(CoreError::Validation(_)));
        assert_eq!(DeliverableMediaType::Audio.to_string(), "audio");
    }
}
