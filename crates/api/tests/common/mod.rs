#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use screener_api::auth::jwt::{generate_access_token, JwtConfig};
use screener_api::auth::password::hash_password;
use screener_api::config::ServerConfig;
use screener_api::notifications::NotificationRouter;
use screener_api::router::build_app_router;
use screener_api::state::AppState;
use screener_core::types::DbId;
use screener_db::models::media::{CreateMedia, Media};
use screener_db::models::project::{CreateProject, Project};
use screener_db::models::user::{CreateUser, User};
use screener_db::repositories::{MediaRepo, ProjectRepo, UserRepo};
use screener_events::{EmailError, EventBus, Mailer, OutgoingEmail};

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Build a test `ServerConfig` with safe defaults. Image uploads are off.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        public_app_url: "https://app.test".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
        image_host: None,
    }
}

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|m| m.to.eq_ignore_ascii_case(address))
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// The router plus handles to what it publishes and sends.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub event_bus: Arc<EventBus>,
    pub mailer: Arc<RecordingMailer>,
    pub config: Arc<ServerConfig>,
}

impl TestApp {
    /// A notification router sharing this app's pool, mailer and config.
    pub fn notification_router(&self) -> NotificationRouter {
        let mailer: Arc<dyn Mailer> = self.mailer.clone();
        NotificationRouter::new(self.pool.clone(), Some(mailer), Arc::clone(&self.config))
    }
}

/// Build the full application router with all middleware layers.
///
/// Uses [`build_app_router`], the same builder as `main.rs`, so tests
/// exercise the production middleware stack.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = Arc::new(test_config());
    let event_bus = Arc::new(EventBus::default());
    let mailer = Arc::new(RecordingMailer::default());
    let dyn_mailer: Arc<dyn Mailer> = mailer.clone();

    let state = AppState {
        pool: pool.clone(),
        config: Arc::clone(&config),
        event_bus: Arc::clone(&event_bus),
        mailer: Some(dyn_mailer),
        image_host: None,
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        event_bus,
        mailer,
        config,
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, email: &str, display_name: Option<&str>) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        },
    )
    .await
    .expect("user creation should succeed")
}

pub async fn seed_project(pool: &PgPool, owner_id: DbId) -> Project {
    ProjectRepo::create(
        pool,
        owner_id,
        &CreateProject {
            title: "Spring campaign".to_string(),
            description: None,
            deadline: None,
            client_name: Some("Acme".to_string()),
        },
    )
    .await
    .expect("project creation should succeed")
}

pub async fn seed_member(pool: &PgPool, project_id: DbId, user_id: DbId, role: &str) {
    let added = ProjectRepo::add_member(pool, project_id, user_id, role)
        .await
        .expect("adding member should succeed");
    assert!(added, "member should be new");
}

pub async fn seed_media(pool: &PgPool, project_id: DbId, title: &str) -> Media {
    MediaRepo::create(
        pool,
        &CreateMedia {
            project_id,
            title: title.to_string(),
            url: format!("https://cdn.test/{title}.mp4"),
            media_type: "video".to_string(),
            version_group_id: None,
            version_number: None,
            uploaded_by: None,
        },
    )
    .await
    .expect("media creation should succeed")
}

pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
    extra_headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, "GET", uri, token, None, &[]).await
}

pub async fn get_with_headers(
    app: &Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> Response<Body> {
    send(app, "GET", uri, None, None, headers).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "POST", uri, token, Some(body), &[]).await
}

pub async fn post_json_with_headers(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
    headers: &[(&str, &str)],
) -> Response<Body> {
    send(app, "POST", uri, token, Some(body), headers).await
}

pub async fn post_empty(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, "POST", uri, token, None, &[]).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, "PUT", uri, token, Some(body), &[]).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, "DELETE", uri, token, None, &[]).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the JSON body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
