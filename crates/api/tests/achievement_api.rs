//! HTTP-level tests for `/achievements` and its evidence files.

mod common;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use common::{
    body_bytes, body_json, delete_auth, get_auth, post_auth, post_file_auth, post_json,
    post_json_auth, put_json_auth, TestApp, TEST_PASSWORD,
};

struct Tokens {
    student: String,
    other_student: String,
    advisor: String,
}

async fn access(app: &TestApp, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn setup() -> (TestApp, Tokens) {
    let app = TestApp::new();
    app.seed_cast().await;
    let tokens = Tokens {
        student: access(&app, "sari@campus.test").await,
        other_student: access(&app, "budi@campus.test").await,
        advisor: access(&app, "dosen@campus.test").await,
    };
    (app, tokens)
}

async fn create(app: &TestApp, token: &str) -> i64 {
    let body = serde_json::json!({
        "title": "X",
        "description": "Y",
        "category": "Z",
        "achievement_date": "2024-01-01",
    });
    let response = post_json_auth(app.app(), "/api/v1/achievements", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// The full review scenario over HTTP.
#[tokio::test]
async fn review_scenario() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;

    let response = post_auth(app.app(), &format!("/api/v1/achievements/{id}/submit"), &t.student).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "submitted");

    let response = get_auth(app.app(), "/api/v1/achievements/pending", &t.advisor).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = post_auth(app.app(), &format!("/api/v1/achievements/{id}/verify"), &t.advisor).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "verified");
    assert!(json["data"]["verified_by"].is_number());

    let body = serde_json::json!({ "reason": "second thoughts" });
    let response = post_json_auth(
        app.app(),
        &format!("/api/v1/achievements/{id}/reject"),
        body,
        &t.advisor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

/// Blank fields are 400.
#[tokio::test]
async fn create_with_blank_title_is_bad_request() {
    let (app, t) = setup().await;
    let body = serde_json::json!({
        "title": "",
        "description": "Y",
        "category": "Z",
        "achievement_date": "2024-01-01",
    });
    let response = post_json_auth(app.app(), "/api/v1/achievements", body, &t.student).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

/// Students cannot reach the review endpoints.
#[tokio::test]
async fn student_cannot_verify() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;
    post_auth(app.app(), &format!("/api/v1/achievements/{id}/submit"), &t.student).await;

    let response = post_auth(app.app(), &format!("/api/v1/achievements/{id}/verify"), &t.student).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.app(), "/api/v1/achievements/pending", &t.student).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Another student cannot read, edit, or delete the record.
#[tokio::test]
async fn other_student_is_forbidden() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;
    let uri = format!("/api/v1/achievements/{id}");

    let response = get_auth(app.app(), &uri, &t.other_student).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "title": "mine now" });
    let response = put_json_auth(app.app(), &uri, body, &t.other_student).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app.app(), &uri, &t.other_student).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Update then delete a draft; afterwards it is 404.
#[tokio::test]
async fn update_and_delete_draft() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;
    let uri = format!("/api/v1/achievements/{id}");

    let body = serde_json::json!({ "title": "Debate champion" });
    let response = put_json_auth(app.app(), &uri, body, &t.student).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Debate champion");

    let response = delete_auth(app.app(), &uri, &t.student).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.app(), &uri, &t.student).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Students list only their own records; advisors list all.
#[tokio::test]
async fn list_is_scoped_by_role() {
    let (app, t) = setup().await;
    create(&app, &t.student).await;
    create(&app, &t.other_student).await;

    let response = get_auth(app.app(), "/api/v1/achievements", &t.student).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get_auth(app.app(), "/api/v1/achievements", &t.advisor).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Upload, list, download, and delete an evidence file.
#[tokio::test]
async fn file_lifecycle() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;
    let files = format!("/api/v1/achievements/{id}/files");

    let response = post_file_auth(app.app(), &files, "certificate.pdf", b"%PDF-1.7", &t.student).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let file_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["content_type"], "application/pdf");
    assert!(json["data"].get("blob_key").is_none());

    let response = get_auth(app.app(), &files, &t.advisor).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let file_uri = format!("{files}/{file_id}");
    let response = get_auth(app.app(), &file_uri, &t.advisor).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"certificate.pdf\""
    );
    assert_eq!(body_bytes(response).await, b"%PDF-1.7");

    let response = delete_auth(app.app(), &file_uri, &t.student).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.blobs.is_empty().await);
}

/// Disallowed extensions are 400.
#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;

    let response = post_file_auth(
        app.app(),
        &format!("/api/v1/achievements/{id}/files"),
        "payload.exe",
        b"MZ",
        &t.student,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Files cannot be added once the record is submitted.
#[tokio::test]
async fn upload_after_submit_is_conflict() {
    let (app, t) = setup().await;
    let id = create(&app, &t.student).await;
    post_auth(app.app(), &format!("/api/v1/achievements/{id}/submit"), &t.student).await;

    let response = post_file_auth(
        app.app(),
        &format!("/api/v1/achievements/{id}/files"),
        "late.pdf",
        b"%PDF",
        &t.student,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
