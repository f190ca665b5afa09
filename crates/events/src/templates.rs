//! Notification email templates.
//!
//! Every template renders a plain-text body and an HTML body. All
//! user-supplied text is escaped before it is placed in HTML.

use screener_core::notification_policy::ActivityKind;

use crate::delivery::OutgoingEmail;

/// Longest comment excerpt quoted in an email.
const EXCERPT_CHARS: usize = 500;

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

fn html_document(greeting: &str, paragraphs: &[String], action_label: &str, action_url: &str) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:sans-serif;color:#222\">\
         <p>Hi {greeting},</p>{body}\
         <p><a href=\"{url}\" style=\"background:#4f46e5;color:#fff;padding:10px 16px;\
         border-radius:6px;text-decoration:none\">{label}</a></p>\
         <p style=\"color:#888;font-size:12px\">You can change which emails you receive in \
         your notification settings.</p></body></html>",
        greeting = escape_html(greeting),
        url = escape_html(action_url),
        label = escape_html(action_label),
    )
}

// ---------------------------------------------------------------------------
// Comment notifications
// ---------------------------------------------------------------------------

/// Data for a comment notification email.
#[derive(Debug, Clone)]
pub struct CommentEmail<'a> {
    pub kind: ActivityKind,
    pub recipient_name: &'a str,
    pub actor_name: &'a str,
    pub project_title: &'a str,
    pub media_title: &'a str,
    pub content: &'a str,
    pub timestamp_seconds: Option<f64>,
    /// Where the recipient can read the thread.
    pub link_url: &'a str,
}

/// Subject line for a comment activity.
pub fn comment_subject(kind: ActivityKind, actor_name: &str, media_title: &str) -> String {
    match kind {
        ActivityKind::CommentReplyToMe => {
            format!("{actor_name} replied to your comment on \"{media_title}\"")
        }
        ActivityKind::CommentReply => format!("{actor_name} replied on \"{media_title}\""),
        _ => format!("{actor_name} commented on \"{media_title}\""),
    }
}

/// Format seconds as `m:ss` (or `h:mm:ss`).
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Render a comment notification for one recipient.
pub fn comment_email(to: &str, data: &CommentEmail<'_>) -> OutgoingEmail {
    let subject = comment_subject(data.kind, data.actor_name, data.media_title);
    let at = data
        .timestamp_seconds
        .map(|t| format!(" at {}", format_timestamp(t)))
        .unwrap_or_default();
    let quote = excerpt(data.content);

    let text_body = format!(
        "Hi {name},\n\n{subject}{at} in {project}:\n\n> {quote}\n\nView the conversation: {url}\n",
        name = data.recipient_name,
        project = data.project_title,
        url = data.link_url,
    );

    let html_body = html_document(
        data.recipient_name,
        &[
            format!(
                "{}{} in <strong>{}</strong>:",
                escape_html(&subject),
                escape_html(&at),
                escape_html(data.project_title)
            ),
            format!(
                "<blockquote style=\"border-left:3px solid #ddd;margin:0;padding-left:12px\">{}</blockquote>",
                escape_html(&quote).replace('\n', "<br>")
            ),
        ],
        "View conversation",
        data.link_url,
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body,
        html_body,
    }
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// Invitation sent to a prospective member.
pub fn invitation_email(
    to: &str,
    inviter_name: &str,
    project_title: &str,
    role: &str,
    accept_url: &str,
) -> OutgoingEmail {
    let subject = format!("{inviter_name} invited you to \"{project_title}\"");
    let text_body = format!(
        "Hi,\n\n{inviter_name} invited you to join {project_title} as {role}.\n\n\
         Accept the invitation: {accept_url}\n"
    );
    let html_body = html_document(
        to,
        &[format!(
            "{} invited you to join <strong>{}</strong> as {}.",
            escape_html(inviter_name),
            escape_html(project_title),
            escape_html(role)
        )],
        "Accept invitation",
        accept_url,
    );
    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body,
        html_body,
    }
}

/// Tells the project owner that an invitation was accepted.
pub fn invitation_accepted_email(
    to: &str,
    owner_name: &str,
    member_name: &str,
    project_title: &str,
    project_url: &str,
) -> OutgoingEmail {
    let subject = format!("{member_name} joined \"{project_title}\"");
    let text_body = format!(
        "Hi {owner_name},\n\n{member_name} accepted your invitation to {project_title}.\n\n\
         Open the project: {project_url}\n"
    );
    let html_body = html_document(
        owner_name,
        &[format!(
            "{} accepted your invitation to <strong>{}</strong>.",
            escape_html(member_name),
            escape_html(project_title)
        )],
        "Open project",
        project_url,
    );
    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body,
        html_body,
    }
}
