//! Integration tests for revision-round tracks and media version swaps.

use chrono::Utc;
use screener_core::workflow::{
    ClientDecision, DeliverableMediaType, StepDraft, StepStatus, TrackStatus, TrackWorkflow,
};
use screener_db::models::media::CreateMedia;
use screener_db::models::project::CreateProject;
use screener_db::models::user::CreateUser;
use screener_db::repositories::{MediaRepo, ProjectRepo, TrackRepo, UserRepo};
use sqlx::PgPool;

async fn new_project(pool: &PgPool) -> i64 {
    let owner = UserRepo::create(
        pool,
        &CreateUser {
            email: "owner@example.com".to_string(),
            display_name: Some("Owner".to_string()),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap();
    ProjectRepo::create(
        pool,
        owner.id,
        &CreateProject {
            title: "Promo".to_string(),
            description: None,
            deadline: None,
            client_name: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn reviewed_workflow() -> TrackWorkflow {
    let mut workflow = TrackWorkflow::new();
    workflow
        .add_step(&StepDraft {
            text: "Brighten intro, ref https://ref.example/a".to_string(),
            comment_id: Some("c-1".to_string()),
            ..StepDraft::default()
        })
        .unwrap();
    workflow.set_step_status(0, StepStatus::Completed, Utc::now()).unwrap();
    workflow
        .complete_final_step("https://cdn.example/v2.mp4", DeliverableMediaType::Video, Utc::now())
        .unwrap();
    workflow
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_round_numbers_increase_per_project(pool: PgPool) {
    let project = new_project(&pool).await;

    let first = TrackRepo::create_round(&pool, project, &TrackWorkflow::new()).await.unwrap();
    let second = TrackRepo::create_round(&pool, project, &TrackWorkflow::new()).await.unwrap();
    assert_eq!(first.round_number, 1);
    assert_eq!(second.round_number, 2);

    let listed = TrackRepo::list_for_project(&pool, project).await.unwrap();
    assert_eq!(listed.iter().map(|t| t.round_number).collect::<Vec<_>>(), vec![1, 2]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_workflow_round_trips_through_jsonb(pool: PgPool) {
    let project = new_project(&pool).await;
    let track = TrackRepo::create_round(&pool, project, &TrackWorkflow::new()).await.unwrap();

    let workflow = reviewed_workflow();
    let saved = TrackRepo::save_workflow(&pool, track.id, &workflow)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(saved.status, "in_review");
    assert_eq!(saved.final_deliverable_media_type.as_deref(), Some("video"));
    assert_eq!(saved.workflow().unwrap(), workflow);
    assert_eq!(saved.steps[1]["is_final"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revisions_requested_opens_next_round(pool: PgPool) {
    let project = new_project(&pool).await;
    let track = TrackRepo::create_round(&pool, project, &TrackWorkflow::new()).await.unwrap();

    let mut workflow = reviewed_workflow();
    TrackRepo::save_workflow(&pool, track.id, &workflow).await.unwrap();
    let next = workflow
        .record_client_decision(ClientDecision::RevisionsRequested)
        .unwrap();

    let (decided, opened) =
        TrackRepo::record_decision(&pool, track.id, ClientDecision::RevisionsRequested, next.as_ref())
            .await
            .unwrap()
            .unwrap();

    assert_eq!(decided.client_decision, "revisions_requested");
    assert!(decided.decided_at.is_some());
    let opened = opened.expect("next round");
    assert_eq!(opened.round_number, 2);
    let opened_workflow = opened.workflow().unwrap();
    assert_eq!(opened_workflow.status, TrackStatus::InProgress);
    assert_eq!(opened_workflow.steps.comment_steps()[0].status, StepStatus::Pending);

    // Decided tracks are frozen.
    assert!(TrackRepo::save_workflow(&pool, track.id, &workflow).await.unwrap().is_none());
    assert!(TrackRepo::record_decision(&pool, track.id, ClientDecision::Approved, None)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_swap_versions_in_one_transaction(pool: PgPool) {
    let project = new_project(&pool).await;
    let v1 = MediaRepo::create(
        &pool,
        &CreateMedia {
            project_id: project,
            title: "Cut".to_string(),
            url: "https://cdn.example/v1.mp4".to_string(),
            media_type: "video".to_string(),
            version_group_id: None,
            version_number: None,
            uploaded_by: None,
        },
    )
    .await
    .unwrap();
    let v2 = MediaRepo::create(
        &pool,
        &CreateMedia {
            project_id: project,
            title: "Cut".to_string(),
            url: "https://cdn.example/v2.mp4".to_string(),
            media_type: "video".to_string(),
            version_group_id: Some(v1.version_group_id),
            version_number: Some(2),
            uploaded_by: None,
        },
    )
    .await
    .unwrap();

    let (a, b) = MediaRepo::swap_versions(&pool, v1.id, v2.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.version_number, 2);
    assert_eq!(b.version_number, 1);

    assert!(MediaRepo::swap_versions(&pool, v1.id, 9_999).await.unwrap().is_none());
    let unchanged = MediaRepo::find_by_id(&pool, v1.id).await.unwrap().unwrap();
    assert_eq!(unchanged.version_number, 2);
}
