#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use laurel_core::attachment::UploadPolicy;
use laurel_core::clock::{Clock, ManualClock};
use laurel_core::roles::{Actor, Role};
use laurel_core::types::{DbId, Timestamp};
use laurel_db::memory::{
    MemoryAchievementStore, MemoryAttachmentStore, MemoryRefreshTokenStore, MemoryUserStore,
};
use laurel_db::models::refresh_token::ClientMeta;
use laurel_db::models::user::{CreateUser, User};
use laurel_db::store::UserStore;
use tower::ServiceExt;

use laurel_api::auth::jwt::JwtConfig;
use laurel_api::auth::password::hash_password;
use laurel_api::blob::MemoryBlobStore;
use laurel_api::config::{ServerConfig, UploadConfig};
use laurel_api::router::build_app_router;
use laurel_api::state::{AppState, Stores};

/// Password given to every seeded account.
pub const TEST_PASSWORD: &str = "correct-horse-42";

pub const TEST_SECRET: &str = "test-secret-do-not-use-in-production";

/// Fixed starting instant for the manual clock.
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        token_sweep_interval_secs: 3600,
        jwt: JwtConfig::with_secret(TEST_SECRET),
        upload: UploadConfig {
            dir: PathBuf::from("unused"),
            policy: UploadPolicy::default(),
        },
    }
}

/// The whole service over in-memory stores and a manual clock.
///
/// Each store handle is kept so tests can inspect rows or inject failures.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub users: Arc<MemoryUserStore>,
    pub tokens: Arc<MemoryRefreshTokenStore>,
    pub achievements: Arc<MemoryAchievementStore>,
    pub attachments: Arc<MemoryAttachmentStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let users = Arc::new(MemoryUserStore::new());
        let tokens = Arc::new(MemoryRefreshTokenStore::new());
        let achievements = Arc::new(MemoryAchievementStore::default());
        let attachments = Arc::new(MemoryAttachmentStore::default());
        let blobs = Arc::new(MemoryBlobStore::new());

        let stores = Stores {
            users: users.clone(),
            refresh_tokens: tokens.clone(),
            achievements: achievements.clone(),
            attachments: attachments.clone(),
        };
        let state = AppState::build(config.clone(), stores, blobs.clone(), clock.clone(), None);
        let router = build_app_router(state.clone(), &config);

        Self {
            state,
            router,
            clock,
            users,
            tokens,
            achievements,
            attachments,
            blobs,
        }
    }

    /// A fresh handle to the router; `oneshot` consumes it.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert an account directly, bypassing the admin endpoint.
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> User {
        let student_number = match role {
            Role::Student => Some(format!("S-{name}")),
            Role::Advisor | Role::Admin => None,
        };
        let input = CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            role,
            student_number,
        };
        self.users
            .create(&input, self.clock.now())
            .await
            .expect("user creation should succeed")
    }

    /// Seed one account of each role.
    pub async fn seed_cast(&self) -> Cast {
        let student = self.seed_user("sari", "sari@campus.test", Role::Student).await;
        let other_student = self.seed_user("budi", "budi@campus.test", Role::Student).await;
        let advisor = self.seed_user("dosen", "dosen@campus.test", Role::Advisor).await;
        let admin = self.seed_user("admin", "admin@campus.test", Role::Admin).await;
        Cast {
            student: student.actor(),
            other_student: other_student.actor(),
            advisor: advisor.actor(),
            admin: admin.actor(),
        }
    }

    /// Log in through the session manager and return (access, refresh).
    pub async fn login(&self, email: &str) -> (String, String) {
        let outcome = self
            .state
            .sessions
            .login(email, TEST_PASSWORD, &ClientMeta::default())
            .await
            .expect("login should succeed");
        (outcome.tokens.access_token, outcome.tokens.refresh_token)
    }

    /// Flip `is_active` off directly in the store, bypassing the admin checks.
    pub async fn deactivate(&self, user_id: DbId) {
        self.users
            .set_active(user_id, false, self.clock.now())
            .await
            .expect("store should accept the update")
            .expect("user should exist");
    }

    /// Soft-delete directly in the store, bypassing the admin checks.
    pub async fn soft_delete(&self, user_id: DbId) {
        let deleted = self
            .users
            .soft_delete(user_id, self.clock.now())
            .await
            .expect("store should accept the update");
        assert!(deleted, "user should exist and not be deleted yet");
    }
}

/// One actor per role, as seeded by [`TestApp::seed_cast`].
#[derive(Debug, Clone, Copy)]
pub struct Cast {
    pub student: Actor,
    pub other_student: Actor,
    pub advisor: Actor,
    pub admin: Actor,
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a single-file multipart form under the `file` field.
pub async fn post_file_auth(
    app: Router,
    uri: &str,
    file_name: &str,
    bytes: &[u8],
    token: &str,
) -> Response {
    let boundary = "laurel-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
