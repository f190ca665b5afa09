//! Commenter identity and identity matching.
//!
//! A commenter is either an authenticated user or a guest known only by an
//! email address and/or a browser session id. Two identities are compared on
//! the first key both of them carry, in priority order: user id, email
//! (case-insensitive), session id.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Who authored a comment (or who might receive a notification).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommenterIdentity {
    pub user_id: Option<DbId>,
    pub email: Option<String>,
    pub session_id: Option<String>,
}

impl CommenterIdentity {
    /// Identity of an authenticated user.
    pub fn user(user_id: DbId, email: Option<String>) -> Self {
        Self {
            user_id: Some(user_id),
            email,
            session_id: None,
        }
    }

    /// Identity of an unauthenticated guest.
    pub fn guest(email: Option<String>, session_id: Option<String>) -> Self {
        Self {
            user_id: None,
            email,
            session_id,
        }
    }

    /// `true` when the identity belongs to an account holder.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Lowercased, trimmed email, if any non-empty email is present.
    pub fn normalized_email(&self) -> Option<String> {
        self.email.as_deref().and_then(normalize_email)
    }

    fn session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Compare two identities on the highest-priority key both carry.
    ///
    /// Returns `false` when the identities share no key at all.
    pub fn is_same_as(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.user_id, other.user_id) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.normalized_email(), other.normalized_email()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.session(), other.session()) {
            return a == b;
        }
        false
    }
}

/// Lowercase and trim an email address. Empty input yields `None`.
pub fn normalize_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
