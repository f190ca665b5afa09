//! Comment input validation.
//!
//! Comments are left on a media item either from the dashboard by a project
//! member or through a public review link by anyone holding the link.

use crate::error::CoreError;
use crate::identity::{normalize_email, CommenterIdentity};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 10_000;

/// Maximum number of drawing objects in one annotation.
pub const MAX_ANNOTATION_OBJECTS: usize = 50;

/// Maximum guest display name length.
pub const MAX_GUEST_NAME_LENGTH: usize = 100;

/// Where a comment was posted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSource {
    Dashboard,
    ReviewLink,
}

impl CommentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::ReviewLink => "review_link",
        }
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// Validate comment text. Empty text is allowed only with an annotation.
pub fn validate_content(content: &str, has_annotation: bool) -> Result<(), CoreError> {
    if content.trim().is_empty() && !has_annotation {
        return Err(CoreError::Validation(
            "Comment content must not be empty".to_string(),
        ));
    }
    let len = content.chars().count();
    if len > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment has {len} characters, maximum is {MAX_COMMENT_LENGTH}"
        )));
    }
    Ok(())
}

/// Validate a media position in seconds.
pub fn validate_timestamp(seconds: f64) -> Result<(), CoreError> {
    if !seconds.is_finite() {
        return Err(CoreError::Validation(
            "timestamp_seconds must be a finite number".to_string(),
        ));
    }
    if seconds < 0.0 {
        return Err(CoreError::Validation(format!(
            "timestamp_seconds must not be negative, got {seconds}"
        )));
    }
    Ok(())
}

/// Validate an on-frame annotation payload.
///
/// The payload must be an array of at most [`MAX_ANNOTATION_OBJECTS`]
/// objects, each carrying `tool` and `data` keys.
pub fn validate_annotation(json: &serde_json::Value) -> Result<(), CoreError> {
    let arr = json
        .as_array()
        .ok_or_else(|| CoreError::Validation("annotation must be a JSON array".to_string()))?;

    if arr.len() > MAX_ANNOTATION_OBJECTS {
        return Err(CoreError::Validation(format!(
            "annotation has {} elements, maximum is {MAX_ANNOTATION_OBJECTS}",
            arr.len()
        )));
    }

    for (i, item) in arr.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            CoreError::Validation(format!("annotation[{i}] must be a JSON object"))
        })?;
        for key in ["tool", "data"] {
            if !obj.contains_key(key) {
                return Err(CoreError::Validation(format!(
                    "annotation[{i}] is missing required key '{key}'"
                )));
            }
        }
    }

    Ok(())
}

/// Validated comment fields, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentInput {
    pub content: String,
    pub annotation: Option<serde_json::Value>,
    pub timestamp_seconds: Option<f64>,
}

/// Validate the user-supplied parts of a new comment.
pub fn validate_comment(
    content: &str,
    annotation: Option<serde_json::Value>,
    timestamp_seconds: Option<f64>,
) -> Result<CommentInput, CoreError> {
    // An empty array carries no drawing.
    let annotation = annotation.filter(|a| !a.is_null() && a.as_array().is_none_or(|v| !v.is_empty()));
    if let Some(a) = &annotation {
        validate_annotation(a)?;
    }
    validate_content(content, annotation.is_some())?;
    if let Some(ts) = timestamp_seconds {
        validate_timestamp(ts)?;
    }
    Ok(CommentInput {
        content: content.trim().to_string(),
        annotation,
        timestamp_seconds,
    })
}

/// Guest identity supplied on a public review-link comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestCommenter {
    pub email: Option<String>,
    pub session_id: Option<String>,
    pub name: Option<String>,
}

impl GuestCommenter {
    pub fn identity(&self) -> CommenterIdentity {
        CommenterIdentity::guest(self.email.clone(), self.session_id.clone())
    }
}

/// Normalize and validate a guest's identity fields.
///
/// At least one of email or session id is required so the guest can later
/// be recognised as the author of their own comments.
pub fn validate_guest(
    email: Option<&str>,
    session_id: Option<&str>,
    name: Option<&str>,
) -> Result<GuestCommenter, CoreError> {
    let email = email.and_then(normalize_email);
    if let Some(e) = &email {
        let valid = e
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(CoreError::Validation(format!("Invalid guest email '{e}'")));
        }
    }
    let session_id = session_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if email.is_none() && session_id.is_none() {
        return Err(CoreError::Validation(
            "Guest comments require an email or a session id".to_string(),
        ));
    }
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if let Some(n) = name {
        if n.chars().count() > MAX_GUEST_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Guest name exceeds maximum length of {MAX_GUEST_NAME_LENGTH} characters"
            )));
        }
    }

    Ok(GuestCommenter {
        email,
        session_id,
        name: name.map(str::to_string),
    })
}
