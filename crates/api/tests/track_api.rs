//! HTTP-level integration tests for revision rounds and their steps.

mod common;

use axum::http::StatusCode;
use common::{
    build_test_app, delete, expect_json, get, post_empty, post_json, put_json, seed_member,
    seed_project, seed_user, token_for,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Actors {
    project_id: i64,
    owner: String,
    editor: String,
    client: String,
    viewer: String,
}

async fn actors(pool: &PgPool) -> Actors {
    let owner = seed_user(pool, "owner@studio.test", None).await;
    let editor = seed_user(pool, "editor@studio.test", None).await;
    let client = seed_user(pool, "client@acme.test", None).await;
    let viewer = seed_user(pool, "viewer@acme.test", None).await;
    let project = seed_project(pool, owner.id).await;
    seed_member(pool, project.id, editor.id, "editor").await;
    seed_member(pool, project.id, client.id, "client").await;
    seed_member(pool, project.id, viewer.id, "viewer").await;

    Actors {
        project_id: project.id,
        owner: token_for(owner.id),
        editor: token_for(editor.id),
        client: token_for(client.id),
        viewer: token_for(viewer.id),
    }
}

async fn start_round(app: &axum::Router, project_id: i64, token: &str) -> serde_json::Value {
    let uri = format!("/api/v1/projects/{project_id}/tracks");
    expect_json(post_empty(app, &uri, Some(token)).await, StatusCode::CREATED).await
}

/// Add one step, complete it, and attach the deliverable.
async fn make_ready(app: &axum::Router, track_id: i64, token: &str) -> serde_json::Value {
    let body = serde_json::json!({ "text": "Fix the color grade", "comment_id": "c-1" });
    let uri = format!("/api/v1/tracks/{track_id}/steps");
    expect_json(post_json(app, &uri, Some(token), body).await, StatusCode::OK).await;

    let uri = format!("/api/v1/tracks/{track_id}/steps/0/status");
    let body = serde_json::json!({ "status": "completed" });
    expect_json(put_json(app, &uri, Some(token), body).await, StatusCode::OK).await;

    let uri = format!("/api/v1/tracks/{track_id}/final");
    let body = serde_json::json!({
        "deliverable_link": "https://files.test/final-v1.mp4",
        "media_type": "video",
    });
    expect_json(post_json(app, &uri, Some(token), body).await, StatusCode::OK).await
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// Opening a round yields round 1 with only the final step.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_start_round(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;

    let json = start_round(&app, a.project_id, &a.editor).await;
    let track = &json["data"];
    assert_eq!(track["round_number"], 1);
    assert_eq!(track["status"], "in_progress");
    assert_eq!(track["client_decision"], "pending");
    let steps = track["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["is_final"], true);

    // A second open round is refused.
    let uri = format!("/api/v1/projects/{}/tracks", a.project_id);
    let response = post_empty(&app, &uri, Some(&a.owner)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = expect_json(get(&app, &uri, Some(&a.viewer)).await, StatusCode::OK).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

/// Clients and viewers cannot open rounds or edit steps.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_step_edits_require_editor(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;

    let uri = format!("/api/v1/projects/{}/tracks", a.project_id);
    let response = post_empty(&app, &uri, Some(&a.client)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let track_id = start_round(&app, a.project_id, &a.owner).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/tracks/{track_id}/steps");
    for token in [&a.client, &a.viewer] {
        let response = post_json(&app, &uri, Some(token), serde_json::json!({ "text": "x" })).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Steps can be added, edited, restructured, and removed.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_step_editing(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.editor).await["data"]["id"]
        .as_i64()
        .unwrap();
    let steps_uri = format!("/api/v1/tracks/{track_id}/steps");

    for (text, key) in [("Trim intro", "a"), ("Louder music https://ref.test/song", "b")] {
        let body = serde_json::json!({ "text": text, "comment_id": key });
        expect_json(post_json(&app, &steps_uri, Some(&a.editor), body).await, StatusCode::OK).await;
    }

    // Complete "a", then reorder so "b" comes first; "a" keeps its status.
    let uri = format!("/api/v1/tracks/{track_id}/steps/0/status");
    let body = serde_json::json!({ "status": "completed" });
    expect_json(put_json(&app, &uri, Some(&a.editor), body).await, StatusCode::OK).await;

    let body = serde_json::json!({ "steps": [
        { "text": "Louder music https://ref.test/song", "comment_id": "b" },
        { "text": "Trim intro", "comment_id": "a" },
    ]});
    let json = expect_json(put_json(&app, &steps_uri, Some(&a.editor), body).await, StatusCode::OK)
        .await;
    let steps = json["data"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["metadata"]["comment_id"], "b");
    assert_eq!(steps[0]["status"], "pending");
    assert_eq!(steps[1]["metadata"]["comment_id"], "a");
    assert_eq!(steps[1]["status"], "completed");
    assert_eq!(steps[0]["metadata"]["links"][0], "https://ref.test/song");

    let uri = format!("/api/v1/tracks/{track_id}/steps/1");
    let body = serde_json::json!({ "name": "Intro", "text": "Trim the first two seconds" });
    let json = expect_json(put_json(&app, &uri, Some(&a.editor), body).await, StatusCode::OK).await;
    assert_eq!(json["data"]["steps"][1]["name"], "Intro");
    assert_eq!(json["data"]["steps"][1]["metadata"]["comment_id"], "a");

    let json = expect_json(delete(&app, &uri, Some(&a.editor)).await, StatusCode::OK).await;
    assert_eq!(json["data"]["steps"].as_array().unwrap().len(), 2);

    // The final step is not addressable by index.
    let uri = format!("/api/v1/tracks/{track_id}/steps/1");
    let response = delete(&app, &uri, Some(&a.editor)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Unknown enum values are validation errors.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_step_status_rejected(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.editor).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/tracks/{track_id}/steps");
    post_json(&app, &uri, Some(&a.editor), serde_json::json!({ "text": "x" })).await;

    let uri = format!("/api/v1/tracks/{track_id}/steps/0/status");
    let body = serde_json::json!({ "status": "done" });
    let json = expect_json(put_json(&app, &uri, Some(&a.editor), body).await, StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

/// Image uploads report 503 when no image host is configured.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_image_upload_disabled(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.editor).await["data"]["id"]
        .as_i64()
        .unwrap();

    let boundary = "XBOUNDARY";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
    );
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(format!("/api/v1/tracks/{track_id}/steps/0/images"))
        .header("authorization", format!("Bearer {}", a.editor))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    let json = expect_json(response, StatusCode::SERVICE_UNAVAILABLE).await;
    assert_eq!(json["code"], "UPLOADS_DISABLED");
}

// ---------------------------------------------------------------------------
// Review and decision
// ---------------------------------------------------------------------------

/// Completing every step and the deliverable moves the track into review;
/// reopening the final step moves it back.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ready_for_review_and_reopen(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.editor).await["data"]["id"]
        .as_i64()
        .unwrap();

    let json = make_ready(&app, track_id, &a.editor).await;
    assert_eq!(json["data"]["status"], "in_review");
    assert_eq!(json["data"]["final_deliverable_media_type"], "video");

    let uri = format!("/api/v1/tracks/{track_id}/final");
    let json = expect_json(delete(&app, &uri, Some(&a.editor)).await, StatusCode::OK).await;
    assert_eq!(json["data"]["status"], "in_progress");
}

/// A decision before review is a conflict; editors cannot decide.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_decision_rules(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.editor).await["data"]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/tracks/{track_id}/decision");
    let approve = serde_json::json!({ "decision": "approved" });

    let response = post_json(&app, &uri, Some(&a.client), approve.clone()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    make_ready(&app, track_id, &a.editor).await;

    let response = post_json(&app, &uri, Some(&a.editor), approve.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "decision": "pending" });
    let response = post_json(&app, &uri, Some(&a.client), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = expect_json(
        post_json(&app, &uri, Some(&a.client), approve.clone()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["data"]["track"]["client_decision"], "approved");
    assert!(json["data"]["next_round"].is_null());

    // Decided tracks are locked.
    let response = post_json(&app, &uri, Some(&a.owner), approve).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let steps_uri = format!("/api/v1/tracks/{track_id}/steps");
    let response =
        post_json(&app, &steps_uri, Some(&a.editor), serde_json::json!({ "text": "late" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Requesting revisions opens the next round with the same steps reset.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revisions_open_next_round(pool: PgPool) {
    let a = actors(&pool).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.editor).await["data"]["id"]
        .as_i64()
        .unwrap();
    make_ready(&app, track_id, &a.editor).await;

    let uri = format!("/api/v1/tracks/{track_id}/decision");
    let body = serde_json::json!({ "decision": "revisions_requested" });
    let json = expect_json(post_json(&app, &uri, Some(&a.client), body).await, StatusCode::OK).await;

    assert_eq!(json["data"]["track"]["client_decision"], "revisions_requested");
    let next = &json["data"]["next_round"];
    assert_eq!(next["round_number"], 2);
    assert_eq!(next["status"], "in_progress");
    assert_eq!(next["client_decision"], "pending");
    let steps = next["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["status"], "pending");
    assert_eq!(steps[0]["metadata"]["comment_id"], "c-1");
    assert!(next["final_deliverable_media_type"].is_null());

    let uri = format!("/api/v1/projects/{}/tracks", a.project_id);
    let json = expect_json(get(&app, &uri, Some(&a.owner)).await, StatusCode::OK).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

/// Outsiders cannot see a project's tracks.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tracks_hidden_from_outsiders(pool: PgPool) {
    let a = actors(&pool).await;
    let stranger = seed_user(&pool, "stranger@else.test", None).await;
    let app = build_test_app(pool).router;
    let track_id = start_round(&app, a.project_id, &a.owner).await["data"]["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/v1/tracks/{track_id}");
    let response = get(&app, &uri, Some(&token_for(stranger.id))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app, "/api/v1/tracks/999999", Some(&a.owner)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
