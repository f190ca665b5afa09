//! Candidate recipients for a comment notification.
//!
//! [`resolve_recipients`] merges the project owner, the accepted members,
//! and every other commenter on a media item into one deduplicated list and
//! drops the comment author. Members always win over outsiders or guests
//! that share their email address.

use std::collections::HashSet;

use serde::Serialize;

use crate::identity::CommenterIdentity;
use crate::types::DbId;

/// How a recipient relates to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Owner,
    Member,
    /// Has an account and commented, but is not a project member.
    Outsider,
    /// No account; known by email and/or session id.
    Guest,
}

impl RecipientRole {
    /// Owners and members are notified according to stored preferences.
    pub fn is_project_member(self) -> bool {
        matches!(self, Self::Owner | Self::Member)
    }
}

/// An account holder with access to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPerson {
    pub user_id: DbId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// A distinct commenter on the media item, as returned by the commenter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commenter {
    pub identity: CommenterIdentity,
    pub display_name: Option<String>,
}

/// A resolved notification candidate. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub identity: CommenterIdentity,
    pub role: RecipientRole,
    pub display_name: Option<String>,
}

impl Recipient {
    pub fn user_id(&self) -> Option<DbId> {
        self.identity.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.identity
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Name used in email greetings.
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or_else(|| self.email())
            .unwrap_or("there")
    }
}

/// Build the deduplicated recipient list for a comment.
///
/// `commenters` must be in first-seen order; earlier entries win ties.
pub fn resolve_recipients(
    owner: &ProjectPerson,
    members: &[ProjectPerson],
    commenters: &[Commenter],
    author: &CommenterIdentity,
) -> Vec<Recipient> {
    let mut seen_users: HashSet<DbId> = HashSet::new();
    let mut seen_emails: HashSet<String> = HashSet::new();
    let mut seen_sessions: HashSet<String> = HashSet::new();
    let mut recipients = Vec::new();

    let people = std::iter::once((owner, RecipientRole::Owner))
        .chain(members.iter().map(|m| (m, RecipientRole::Member)));

    for (person, role) in people {
        if !seen_users.insert(person.user_id) {
            continue;
        }
        let identity = CommenterIdentity::user(person.user_id, person.email.clone());
        if let Some(email) = identity.normalized_email() {
            seen_emails.insert(email);
        }
        recipients.push(Recipient {
            identity,
            role,
            display_name: person.display_name.clone(),
        });
    }

    for commenter in commenters {
        let identity = &commenter.identity;
        let email = identity.normalized_email();

        if let Some(user_id) = identity.user_id {
            if seen_users.contains(&user_id) {
                continue;
            }
            if email.as_ref().is_some_and(|e| seen_emails.contains(e)) {
                continue;
            }
            seen_users.insert(user_id);
            if let Some(email) = email {
                seen_emails.insert(email);
            }
            recipients.push(Recipient {
                identity: identity.clone(),
                role: RecipientRole::Outsider,
                display_name: commenter.display_name.clone(),
            });
            continue;
        }

        let session = identity
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let already_seen = match (&email, &session) {
            (Some(e), _) => seen_emails.contains(e),
            (None, Some(s)) => seen_sessions.contains(s),
            (None, None) => true,
        };
        if already_seen {
            continue;
        }
        if let Some(email) = email {
            seen_emails.insert(email);
        }
        if let Some(session) = session {
            seen_sessions.insert(session);
        }
        recipients.push(Recipient {
            identity: identity.clone(),
            role: RecipientRole::Guest,
            display_name: commenter.display_name.clone(),
        });
    }

    recipients.retain(|r| !r.identity.is_same_as(author));
    recipients
}
