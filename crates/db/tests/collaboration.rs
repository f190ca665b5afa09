//! Integration tests for projects, membership, invitations and comments.

use chrono::{Duration, Utc};
use screener_core::recipients::Commenter;
use screener_db::models::comment::CreateComment;
use screener_db::models::media::CreateMedia;
use screener_db::models::project::CreateProject;
use screener_db::models::user::CreateUser;
use screener_db::repositories::{CommentRepo, InvitationRepo, MediaRepo, ProjectRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: None,
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_project(pool: &PgPool, owner_id: i64) -> i64 {
    ProjectRepo::create(
        pool,
        owner_id,
        &CreateProject {
            title: "Launch video".to_string(),
            description: None,
            deadline: None,
            client_name: Some("Acme".to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

async fn new_media(pool: &PgPool, project_id: i64) -> i64 {
    MediaRepo::create(
        pool,
        &CreateMedia {
            project_id,
            title: "Cut 1".to_string(),
            url: "https://cdn.example/cut1.mp4".to_string(),
            media_type: "video".to_string(),
            version_group_id: None,
            version_number: None,
            uploaded_by: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn user_comment(media_id: i64, user_id: i64, content: &str) -> CreateComment {
    CreateComment {
        media_id,
        user_id: Some(user_id),
        content: content.to_string(),
        source: "dashboard".to_string(),
        ..CreateComment::default()
    }
}

fn guest_comment(media_id: i64, email: Option<&str>, session: &str) -> CreateComment {
    CreateComment {
        media_id,
        guest_email: email.map(str::to_string),
        guest_session_id: Some(session.to_string()),
        guest_name: Some("Guest".to_string()),
        content: "guest note".to_string(),
        source: "review_link".to_string(),
        ..CreateComment::default()
    }
}

// ---------------------------------------------------------------------------
// Access and membership
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_access_for_owner_and_members_only(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let member = new_user(&pool, "member@example.com").await;
    let stranger = new_user(&pool, "stranger@example.com").await;
    let project = new_project(&pool, owner).await;

    assert!(ProjectRepo::add_member(&pool, project, member, "editor").await.unwrap());
    assert!(!ProjectRepo::add_member(&pool, project, member, "viewer").await.unwrap());

    assert!(ProjectRepo::has_access(&pool, project, owner).await.unwrap());
    assert!(ProjectRepo::has_access(&pool, project, member).await.unwrap());
    assert!(!ProjectRepo::has_access(&pool, project, stranger).await.unwrap());

    let members = ProjectRepo::list_members(&pool, project).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, "editor");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_email_unique_case_insensitive(pool: PgPool) {
    new_user(&pool, "dup@example.com").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            email: "DUP@example.com".to_string(),
            display_name: None,
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));

    let found = UserRepo::find_by_email(&pool, "Dup@Example.com").await.unwrap();
    assert!(found.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invitation_accept_is_one_shot(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let invitee = new_user(&pool, "client@example.com").await;
    let project = new_project(&pool, owner).await;

    let invitation = InvitationRepo::create(
        &pool,
        project,
        "client@example.com",
        "client",
        "tok123",
        owner,
        Utc::now() + Duration::days(7),
    )
    .await
    .unwrap();

    assert!(InvitationRepo::accept(&pool, &invitation, invitee).await.unwrap());
    assert!(!InvitationRepo::accept(&pool, &invitation, invitee).await.unwrap());

    let stored = InvitationRepo::find_by_token(&pool, "tok123").await.unwrap().unwrap();
    assert!(stored.accepted_at.is_some());
    assert!(ProjectRepo::has_access(&pool, project, invitee).await.unwrap());
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_commenters_first_seen_order(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let outsider = new_user(&pool, "outsider@example.com").await;
    let project = new_project(&pool, owner).await;
    let media = new_media(&pool, project).await;

    CommentRepo::create(&pool, &guest_comment(media, Some("g@example.com"), "s1")).await.unwrap();
    CommentRepo::create(&pool, &user_comment(media, outsider, "first")).await.unwrap();
    CommentRepo::create(&pool, &guest_comment(media, Some("g@example.com"), "s1")).await.unwrap();
    CommentRepo::create(&pool, &user_comment(media, outsider, "second")).await.unwrap();
    CommentRepo::create(&pool, &guest_comment(media, None, "s2")).await.unwrap();

    let commenters: Vec<Commenter> = CommentRepo::list_commenters(&pool, media)
        .await
        .unwrap()
        .into_iter()
        .map(Commenter::from)
        .collect();

    assert_eq!(commenters.len(), 3);
    assert_eq!(commenters[0].identity.email.as_deref(), Some("g@example.com"));
    assert_eq!(commenters[0].identity.session_id.as_deref(), Some("s1"));
    assert_eq!(commenters[1].identity.user_id, Some(outsider));
    assert_eq!(
        commenters[1].identity.email.as_deref(),
        Some("outsider@example.com")
    );
    assert_eq!(commenters[1].identity.session_id, None);
    assert_eq!(commenters[2].identity.session_id.as_deref(), Some("s2"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_comment_removes_replies(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let project = new_project(&pool, owner).await;
    let media = new_media(&pool, project).await;

    let parent = CommentRepo::create(&pool, &user_comment(media, owner, "parent")).await.unwrap();
    let mut reply = user_comment(media, owner, "reply");
    reply.parent_comment_id = Some(parent.id);
    let reply = CommentRepo::create(&pool, &reply).await.unwrap();

    assert!(CommentRepo::delete(&pool, parent.id).await.unwrap());
    assert!(CommentRepo::find_by_id(&pool, reply.id).await.unwrap().is_none());
    assert!(CommentRepo::list_for_media(&pool, media).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comment_requires_an_author(pool: PgPool) {
    let owner = new_user(&pool, "owner@example.com").await;
    let project = new_project(&pool, owner).await;
    let media = new_media(&pool, project).await;

    let anonymous = CreateComment {
        media_id: media,
        content: "who am i".to_string(),
        source: "review_link".to_string(),
        ..CreateComment::default()
    };
    assert!(CommentRepo::create(&pool, &anonymous).await.is_err());
}
