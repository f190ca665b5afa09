//! Project member roles.

use crate::error::CoreError;

/// Pseudo-role reported for the project owner.
pub const ROLE_OWNER: &str = "owner";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_CLIENT: &str = "client";
pub const ROLE_VIEWER: &str = "viewer";

/// Roles a member can be invited with.
pub const VALID_MEMBER_ROLES: &[&str] = &[ROLE_EDITOR, ROLE_CLIENT, ROLE_VIEWER];

/// Validate a member role name.
pub fn validate_member_role(role: &str) -> Result<(), CoreError> {
    if VALID_MEMBER_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_MEMBER_ROLES.join(", ")
        )))
    }
}

/// Owners and editors maintain revision steps.
pub fn can_edit_tracks(role: &str) -> bool {
    matches!(role, ROLE_OWNER | ROLE_EDITOR)
}

/// Owners and clients record the client decision on a round.
pub fn can_decide(role: &str) -> bool {
    matches!(role, ROLE_OWNER | ROLE_CLIENT)
}

/// Project statuses.
pub const VALID_PROJECT_STATUSES: &[&str] = &["active", "completed", "archived"];
