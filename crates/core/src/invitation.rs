//! Project invitation lifecycle rules.

use chrono::Duration;

use crate::error::CoreError;
use crate::identity::normalize_email;
use crate::review_link::generate_token;
use crate::types::Timestamp;

/// Default lifetime of an invitation.
pub const DEFAULT_INVITATION_DAYS: i64 = 7;

/// Expiry for an invitation created at `now`.
pub fn default_expiry(now: Timestamp) -> Timestamp {
    now + Duration::days(DEFAULT_INVITATION_DAYS)
}

/// Token sent in the invitation email.
pub fn generate_invitation_token() -> String {
    generate_token()
}

/// Normalize and validate the invitee email.
pub fn validate_invitee_email(email: &str) -> Result<String, CoreError> {
    let email = normalize_email(email)
        .ok_or_else(|| CoreError::Validation("Invitee email is required".to_string()))?;
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(CoreError::Validation(format!("Invalid invitee email '{email}'")));
    }
    Ok(email)
}

/// State of an invitation row relevant to acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationState<'a> {
    pub email: &'a str,
    pub expires_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
}

/// Check that `user_email` may accept the invitation at `now`.
pub fn check_acceptance(
    invitation: &InvitationState<'_>,
    user_email: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    if invitation.accepted_at.is_some() {
        return Err(CoreError::Conflict(
            "Invitation has already been used".to_string(),
        ));
    }
    if normalize_email(invitation.email) != normalize_email(user_email) {
        return Err(CoreError::Forbidden(
            "Invitation was sent to a different email address".to_string(),
        ));
    }
    if invitation.expires_at <= now {
        return Err(CoreError::Forbidden("Invitation has expired".to_string()));
    }
    Ok(())
}
