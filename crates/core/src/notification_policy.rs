//! Per-recipient notification policy.
//!
//! Decides, for one [`Recipient`] and one triggering comment, whether a
//! notification is sent and through which channels. The decision is
//! recomputed on every dispatch; nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::CommenterIdentity;
use crate::recipients::{Recipient, RecipientRole};

/// Kind of activity a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// A new top-level comment.
    Comment,
    /// A reply to somebody else's comment.
    CommentReply,
    /// A reply to the recipient's own comment.
    CommentReplyToMe,
    /// An invitation to the project was accepted.
    InvitationAccepted,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::CommentReply => "comment_reply",
            Self::CommentReplyToMe => "comment_reply_to_me",
            Self::InvitationAccepted => "invitation_accepted",
        }
    }
}

/// Delivery channel selection stored in a personal preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Activity,
    Email,
    Both,
}

impl DeliveryMethod {
    pub fn includes_activity(self) -> bool {
        matches!(self, Self::Activity | Self::Both)
    }

    pub fn includes_email(self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }
}

/// One personal preference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPreference {
    pub enabled: bool,
    pub delivery: DeliveryMethod,
}

impl ActivityPreference {
    const fn on(delivery: DeliveryMethod) -> Self {
        Self {
            enabled: true,
            delivery,
        }
    }
}

fn default_comment() -> ActivityPreference {
    ActivityPreference::on(DeliveryMethod::Both)
}

fn default_comment_reply() -> ActivityPreference {
    ActivityPreference::on(DeliveryMethod::Activity)
}

fn default_comment_reply_to_me() -> ActivityPreference {
    ActivityPreference::on(DeliveryMethod::Both)
}

/// A user's personal notification preferences, stored as JSON.
///
/// Missing keys fall back to the defaults, so partially written documents
/// remain valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    #[serde(default = "default_comment")]
    pub comment: ActivityPreference,
    #[serde(default = "default_comment_reply")]
    pub comment_reply: ActivityPreference,
    #[serde(default = "default_comment_reply_to_me")]
    pub comment_reply_to_me: ActivityPreference,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            comment: default_comment(),
            comment_reply: default_comment_reply(),
            comment_reply_to_me: default_comment_reply_to_me(),
        }
    }
}

impl NotificationPrefs {
    /// Parse a stored preference document.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid notification preferences: {e}")))
    }

    /// Preference entry for a comment activity kind.
    ///
    /// Non-comment kinds have no personal preference and return `None`.
    pub fn for_kind(&self, kind: ActivityKind) -> Option<ActivityPreference> {
        match kind {
            ActivityKind::Comment => Some(self.comment),
            ActivityKind::CommentReply => Some(self.comment_reply),
            ActivityKind::CommentReplyToMe => Some(self.comment_reply_to_me),
            ActivityKind::InvitationAccepted => None,
        }
    }
}

/// Notification settings of an owner or member for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSettings {
    /// Project-level toggle for this user.
    pub project_enabled: bool,
    pub prefs: NotificationPrefs,
}

/// What to deliver to one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryPlan {
    pub kind: ActivityKind,
    pub activity: bool,
    pub email: bool,
}

/// Decide how `recipient` is notified about a comment.
///
/// `parent_author` is the author of the parent comment when the triggering
/// comment is a reply, `None` for a top-level comment. `settings` must be
/// provided for owners and members; a member without settings is skipped.
pub fn plan_delivery(
    recipient: &Recipient,
    parent_author: Option<&CommenterIdentity>,
    settings: Option<&MemberSettings>,
) -> Option<DeliveryPlan> {
    let reply_to_recipient = parent_author.is_some_and(|p| p.is_same_as(&recipient.identity));

    let (kind, wants_activity, wants_email) = if recipient.role.is_project_member() {
        let settings = settings?;
        if !settings.project_enabled {
            return None;
        }
        let kind = match parent_author {
            None => ActivityKind::Comment,
            Some(_) if reply_to_recipient => ActivityKind::CommentReplyToMe,
            Some(_) => ActivityKind::CommentReply,
        };
        let pref = settings.prefs.for_kind(kind)?;
        if !pref.enabled {
            return None;
        }
        (
            kind,
            pref.delivery.includes_activity(),
            pref.delivery.includes_email(),
        )
    } else {
        if !reply_to_recipient {
            return None;
        }
        // Guests have no feed; outsiders get both channels.
        let wants_activity = recipient.role == RecipientRole::Outsider;
        (ActivityKind::CommentReplyToMe, wants_activity, true)
    };

    let plan = DeliveryPlan {
        kind,
        activity: wants_activity && recipient.user_id().is_some(),
        email: wants_email && recipient.email().is_some(),
    };

    (plan.activity || plan.email).then_some(plan)
}
