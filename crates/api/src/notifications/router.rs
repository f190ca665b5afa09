//! Event-to-notification fan-out.
//!
//! [`NotificationRouter`] subscribes to the platform event bus. For every
//! `comment.created` event it resolves the recipients of the comment,
//! applies each recipient's notification policy, and writes activity rows
//! and sends emails. `invitation.accepted` events notify the project owner.
//!
//! Each recipient is handled independently: a failed lookup, insert or send
//! is logged and skips only that recipient.

use std::sync::Arc;

use screener_core::identity::CommenterIdentity;
use screener_core::notification_policy::{
    plan_delivery, ActivityKind, DeliveryPlan, MemberSettings, NotificationPrefs,
};
use screener_core::recipients::{
    resolve_recipients, Commenter, ProjectPerson, Recipient, RecipientRole,
};
use screener_core::types::DbId;
use screener_db::models::comment::MediaComment;
use screener_db::models::media::Media;
use screener_db::models::notification::NewActivity;
use screener_db::models::project::Project;
use screener_db::repositories::{
    ActivityRepo, CommentRepo, MediaRepo, NotificationPreferenceRepo, ProjectRepo, UserRepo,
};
use screener_db::DbPool;
use screener_events::bus::{COMMENT_CREATED, INVITATION_ACCEPTED};
use screener_events::templates::{self, CommentEmail};
use screener_events::{CommentCreated, InvitationAccepted, Mailer, OutgoingEmail, PlatformEvent};
use tokio::sync::broadcast;

use crate::config::ServerConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Display name used when a guest left neither a name nor an email.
const ANONYMOUS_NAME: &str = "A guest";

/// Counts of what one dispatch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Activity rows written.
    pub activities: usize,
    /// Emails handed to the mailer successfully.
    pub emails: usize,
    /// Recipients the policy excluded or whose settings could not be read.
    pub skipped: usize,
}

/// Routes platform events to activity rows and emails.
pub struct NotificationRouter {
    pool: DbPool,
    mailer: Option<Arc<dyn Mailer>>,
    config: Arc<ServerConfig>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, mailer: Option<Arc<dyn Mailer>>, config: Arc<ServerConfig>) -> Self {
        Self {
            pool,
            mailer,
            config,
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](screener_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        match event.event_type.as_str() {
            COMMENT_CREATED => {
                if let Some(payload) = event.payload_as::<CommentCreated>(COMMENT_CREATED) {
                    let summary = self.notify_comment(&payload).await?;
                    tracing::info!(
                        comment_id = payload.comment_id,
                        source = payload.source.as_str(),
                        activities = summary.activities,
                        emails = summary.emails,
                        skipped = summary.skipped,
                        "Comment notifications dispatched"
                    );
                }
            }
            INVITATION_ACCEPTED => {
                if let Some(payload) = event.payload_as::<InvitationAccepted>(INVITATION_ACCEPTED) {
                    let summary = self.notify_invitation_accepted(&payload).await?;
                    tracing::info!(
                        invitation_id = payload.invitation_id,
                        activities = summary.activities,
                        emails = summary.emails,
                        "Invitation acceptance dispatched"
                    );
                }
            }
            other => tracing::trace!(event_type = other, "No notification route"),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Notify everybody involved in the thread of a new comment.
    ///
    /// Errors loading the comment context abort the whole dispatch; errors
    /// for a single recipient only skip that recipient.
    pub async fn notify_comment(
        &self,
        payload: &CommentCreated,
    ) -> Result<DispatchSummary, sqlx::Error> {
        let mut summary = DispatchSummary::default();

        let Some(comment) = CommentRepo::find_by_id(&self.pool, payload.comment_id).await? else {
            tracing::debug!(comment_id = payload.comment_id, "Comment gone before dispatch");
            return Ok(summary);
        };
        let Some(media) = MediaRepo::find_by_id(&self.pool, comment.media_id).await? else {
            return Ok(summary);
        };
        let Some(project) = ProjectRepo::find_by_id(&self.pool, media.project_id).await? else {
            return Ok(summary);
        };
        let Some(owner) = ProjectRepo::find_owner(&self.pool, project.id).await? else {
            return Ok(summary);
        };
        let owner: ProjectPerson = owner.into();

        let members: Vec<ProjectPerson> = ProjectRepo::list_members(&self.pool, project.id)
            .await?
            .into_iter()
            .map(|m| ProjectPerson {
                user_id: m.user_id,
                email: Some(m.email),
                display_name: m.display_name,
            })
            .collect();
        let commenters: Vec<Commenter> = CommentRepo::list_commenters(&self.pool, media.id)
            .await?
            .into_iter()
            .map(Commenter::from)
            .collect();

        let (author, actor_name) = self.describe_author(&comment).await?;
        // The account email lets an authenticated parent author match a
        // guest entry that kept the same address.
        let parent_author = match comment.parent_comment_id {
            Some(parent_id) => match CommentRepo::find_by_id(&self.pool, parent_id).await? {
                Some(parent) => Some(self.describe_author(&parent).await?.0),
                None => None,
            },
            None => None,
        };

        let recipients = resolve_recipients(&owner, &members, &commenters, &author);
        tracing::debug!(
            comment_id = comment.id,
            recipients = recipients.len(),
            is_reply = parent_author.is_some(),
            "Resolved comment recipients"
        );

        for recipient in &recipients {
            let settings = match recipient.user_id() {
                Some(user_id) if recipient.role.is_project_member() => {
                    match self.member_settings(project.id, user_id).await {
                        Ok(settings) => Some(settings),
                        Err(e) => {
                            tracing::warn!(
                                user_id,
                                error = %e,
                                "Could not load notification settings, skipping recipient"
                            );
                            summary.skipped += 1;
                            continue;
                        }
                    }
                }
                _ => None,
            };

            let Some(plan) = plan_delivery(recipient, parent_author.as_ref(), settings.as_ref())
            else {
                summary.skipped += 1;
                continue;
            };

            let context = CommentContext {
                comment: &comment,
                media: &media,
                project: &project,
                actor_name: &actor_name,
                review_token: payload.review_token.as_deref(),
            };
            self.deliver_comment(recipient, plan, &context, &mut summary)
                .await;
        }

        Ok(summary)
    }

    /// Author identity (with the account email filled in) and display name.
    async fn describe_author(
        &self,
        comment: &MediaComment,
    ) -> Result<(CommenterIdentity, String), sqlx::Error> {
        match comment.user_id {
            Some(user_id) => {
                let user = UserRepo::find_by_id(&self.pool, user_id).await?;
                let name = user
                    .as_ref()
                    .map(|u| u.public_name().to_string())
                    .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
                Ok((CommenterIdentity::user(user_id, user.map(|u| u.email)), name))
            }
            None => {
                let name = comment
                    .guest_name
                    .clone()
                    .or_else(|| comment.guest_email.clone())
                    .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
                Ok((comment.author_identity(), name))
            }
        }
    }

    /// Project toggle (default on) and personal preferences (default set).
    async fn member_settings(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<MemberSettings, BoxError> {
        let project_enabled =
            NotificationPreferenceRepo::project_enabled(&self.pool, project_id, user_id)
                .await?
                .unwrap_or(true);
        let prefs = match NotificationPreferenceRepo::find_prefs(&self.pool, user_id).await? {
            Some(row) => NotificationPrefs::from_json(&row.prefs)?,
            None => NotificationPrefs::default(),
        };
        Ok(MemberSettings {
            project_enabled,
            prefs,
        })
    }

    async fn deliver_comment(
        &self,
        recipient: &Recipient,
        plan: DeliveryPlan,
        ctx: &CommentContext<'_>,
        summary: &mut DispatchSummary,
    ) {
        if plan.activity {
            if let Some(user_id) = recipient.user_id() {
                let activity = NewActivity {
                    user_id,
                    project_id: ctx.project.id,
                    media_id: Some(ctx.media.id),
                    comment_id: Some(ctx.comment.id),
                    kind: plan.kind.as_str().to_string(),
                    actor_name: ctx.actor_name.to_string(),
                    message: templates::comment_subject(plan.kind, ctx.actor_name, &ctx.media.title),
                };
                match ActivityRepo::create(&self.pool, &activity).await {
                    Ok(_) => summary.activities += 1,
                    Err(e) => tracing::warn!(user_id, error = %e, "Failed to write activity"),
                }
            }
        }

        if plan.email {
            if let Some(to) = recipient.email() {
                let link_url = self.comment_link(recipient, ctx);
                let email = templates::comment_email(
                    to,
                    &CommentEmail {
                        kind: plan.kind,
                        recipient_name: recipient.greeting_name(),
                        actor_name: ctx.actor_name,
                        project_title: &ctx.project.title,
                        media_title: &ctx.media.title,
                        content: &ctx.comment.content,
                        timestamp_seconds: ctx.comment.timestamp_seconds,
                        link_url: &link_url,
                    },
                );
                if self.send_email(&email).await {
                    summary.emails += 1;
                }
            }
        }
    }

    /// Members open the media in the app; guests go back through the
    /// review link they commented on.
    fn comment_link(&self, recipient: &Recipient, ctx: &CommentContext<'_>) -> String {
        match (recipient.role, ctx.review_token) {
            (RecipientRole::Guest, Some(token)) => self.config.app_url(&format!("/review/{token}")),
            _ => self.config.app_url(&format!(
                "/projects/{}/media/{}",
                ctx.project.id, ctx.media.id
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Invitations
    // -----------------------------------------------------------------------

    /// Tell the project owner that an invitation was accepted.
    pub async fn notify_invitation_accepted(
        &self,
        payload: &InvitationAccepted,
    ) -> Result<DispatchSummary, sqlx::Error> {
        let mut summary = DispatchSummary::default();

        let Some(project) = ProjectRepo::find_by_id(&self.pool, payload.project_id).await? else {
            return Ok(summary);
        };
        let Some(owner) = ProjectRepo::find_owner(&self.pool, project.id).await? else {
            return Ok(summary);
        };
        let Some(member) = UserRepo::find_by_id(&self.pool, payload.member_user_id).await? else {
            return Ok(summary);
        };
        if owner.user_id == member.id {
            return Ok(summary);
        }

        let enabled =
            NotificationPreferenceRepo::project_enabled(&self.pool, project.id, owner.user_id)
                .await?
                .unwrap_or(true);
        if !enabled {
            summary.skipped += 1;
            return Ok(summary);
        }

        let member_name = member.public_name();
        let activity = NewActivity {
            user_id: owner.user_id,
            project_id: project.id,
            media_id: None,
            comment_id: None,
            kind: ActivityKind::InvitationAccepted.as_str().to_string(),
            actor_name: member_name.to_string(),
            message: format!("{member_name} joined \"{}\"", project.title),
        };
        match ActivityRepo::create(&self.pool, &activity).await {
            Ok(_) => summary.activities += 1,
            Err(e) => tracing::warn!(user_id = owner.user_id, error = %e, "Failed to write activity"),
        }

        let owner_name = owner.display_name.as_deref().unwrap_or(&owner.email);
        let email = templates::invitation_accepted_email(
            &owner.email,
            owner_name,
            member_name,
            &project.title,
            &self.config.app_url(&format!("/projects/{}", project.id)),
        );
        if self.send_email(&email).await {
            summary.emails += 1;
        }

        Ok(summary)
    }

    /// Send through the mailer, logging failures. Returns `true` on success.
    async fn send_email(&self, email: &OutgoingEmail) -> bool {
        let Some(mailer) = &self.mailer else {
            tracing::debug!(to = %email.to, "Email disabled, not sending");
            return false;
        };
        match mailer.send(email).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(to = %email.to, error = %e, "Failed to send notification email");
                false
            }
        }
    }
}

/// Rows shared by every recipient of one comment.
struct CommentContext<'a> {
    comment: &'a MediaComment,
    media: &'a Media,
    project: &'a Project,
    actor_name: &'a str,
    review_token: Option<&'a str>,
}
