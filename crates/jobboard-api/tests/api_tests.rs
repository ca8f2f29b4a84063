//! API integration tests against in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobboard_api::{create_router, ApiConfig, AppState, AuthUser, StaticTokens, StoreBackend};
use jobboard_firestore::codec::user_to_fields;
use jobboard_firestore::user_repo::USERS_COLLECTION;
use jobboard_firestore::{DocumentStore, MemoryStore};
use jobboard_mailer::{MailerConfig, SendGridClient};
use jobboard_models::NewUserProfile;
use jobboard_storage::MemoryBlobStore;

const ALICE: &str = "token-alice";
const BOB: &str = "token-bob";

struct TestApp {
    router: Router,
    state: AppState,
    store: Arc<MemoryStore>,
}

fn test_app(mailer: Option<SendGridClient>) -> TestApp {
    let config = ApiConfig {
        document_store: StoreBackend::Memory,
        contact_rate_limit_per_minute: 3,
        ..Default::default()
    };
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new("https://files.jobs.test"));
    let verifier = StaticTokens::new()
        .with_user(ALICE, AuthUser::new("alice", Some("alice@mail.test")))
        .with_user(BOB, AuthUser::new("bob", Some("bob@mail.test")));

    let state = AppState::from_parts(
        config,
        store.clone(),
        blobs,
        mailer,
        Arc::new(verifier),
    );
    TestApp {
        router: create_router(state.clone(), None),
        state,
        store,
    }
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn job_body(title: &str, skills: &[&str], city: &str) -> Value {
    json!({
        "title": title,
        "description": "Build things",
        "companyName": "Acme",
        "location": { "city": city, "country": "Australia", "remote": false },
        "jobType": "full-time",
        "experienceLevel": "mid",
        "salary": { "min": 90000.0, "max": 120000.0, "currency": "AUD" },
        "requiredSkills": skills,
    })
}

async fn sign_up(app: &TestApp, token: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/users/me",
        Some(token),
        Some(json!({ "firstName": "Test", "lastName": "User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn make_admin(app: &TestApp, uid: &str) {
    let mut profile = NewUserProfile {
        email: format!("{}@mail.test", uid),
        first_name: "Admin".into(),
        last_name: "User".into(),
        ..Default::default()
    }
    .into_profile(uid, Utc::now());
    profile.role = "admin".into();
    app.store
        .set_document(USERS_COLLECTION, uid, user_to_fields(&profile))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = test_app(None);

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["email"]["status"], "disabled");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = test_app(None);
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_write_routes_require_auth() {
    let app = test_app(None);

    let (status, body) = send(&app, "POST", "/api/jobs", None, Some(job_body("A", &[], "Perth"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, _) = send(&app, "GET", "/api/users/me", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_sign_up_uses_token_email() {
    let app = test_app(None);

    let (status, _) = send(&app, "GET", "/api/users/me", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    sign_up(&app, ALICE).await;

    let (status, body) = send(&app, "GET", "/api/users/me", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "alice");
    assert_eq!(body["email"], "alice@mail.test");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_job_board_flow() {
    let app = test_app(None);

    let (status, body) = send(
        &app,
        "POST",
        "/api/jobs",
        Some(ALICE),
        Some(job_body("Rust Engineer", &["rust", "tokio"], "Melbourne")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = body["id"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(2)).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/jobs",
        Some(ALICE),
        Some(job_body("Go Engineer", &["go"], "Sydney")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Listing, newest first
    let (status, page) = send(&app, "GET", "/api/jobs?limit=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["jobs"][0]["title"], "Go Engineer");
    assert_eq!(page["hasMore"], true);
    let cursor = page["lastDoc"].as_str().unwrap().to_string();

    let (status, page) = send(
        &app,
        "GET",
        &format!("/api/jobs?limit=1&cursor={}", cursor),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["jobs"][0]["title"], "Rust Engineer");
    assert_eq!(page["hasMore"], false);
    assert_eq!(page["lastDoc"], Value::Null);

    let (_, count) = send(&app, "GET", "/api/jobs/count", None, None).await;
    assert_eq!(count["count"], 2);

    // Search
    let (status, found) = send(
        &app,
        "GET",
        "/api/jobs/search?skills=tokio,python&location=melb",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["count"], 1);
    assert_eq!(found["jobs"][0]["title"], "Rust Engineer");

    // View counter runs in the background
    let (status, job) = send(&app, "GET", &format!("/api/jobs/{}", job_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["postedBy"], "alice");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.state.jobs.get_job_by_id(&job_id).await.unwrap().views, 1);

    // Apply once, then conflict
    let apply_uri = format!("/api/jobs/{}/apply", job_id);
    let (status, application) = send(
        &app,
        "POST",
        &apply_uri,
        Some(BOB),
        Some(json!({ "coverLetter": "Hire me" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["userId"], "bob");

    let (status, body) = send(&app, "POST", &apply_uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_applied");
    assert_eq!(body["detail"], "You have already applied to this job");

    let (status, mine) = send(&app, "GET", "/api/me/applications", Some(BOB), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["applications"][0]["jobId"], job_id.as_str());

    // Ratings
    let rate_uri = format!("/api/jobs/{}/rate", job_id);
    let (status, _) = send(&app, "POST", &rate_uri, Some(BOB), Some(json!({ "rating": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, summary) = send(
        &app,
        "POST",
        &rate_uri,
        Some(BOB),
        Some(json!({ "rating": 4, "comment": "Nice team" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["ratingCount"], 1);
    assert_eq!(summary["averageRating"], 4.0);

    // Save toggles
    let save_uri = format!("/api/jobs/{}/save", job_id);
    let (_, saved) = send(&app, "POST", &save_uri, Some(BOB), None).await;
    assert_eq!(saved["saved"], true);
    let (_, saved) = send(&app, "POST", &save_uri, Some(BOB), None).await;
    assert_eq!(saved["saved"], false);

    let job = app.state.jobs.get_job_by_id(&job_id).await.unwrap();
    assert_eq!(job.applicant_count, 1);
    assert_eq!(job.saves, 0);
}

#[tokio::test]
async fn test_missing_job_and_bad_input() {
    let app = test_app(None);

    let (status, body) = send(&app, "GET", "/api/jobs/missing-job", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Job not found");
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(&app, "GET", "/api/jobs?cursor=garbage", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid pagination cursor");

    let (status, _) = send(&app, "GET", "/api/jobs/search?jobType=gig", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/jobs/missing-job/apply", Some(BOB), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = test_app(None);
    sign_up(&app, BOB).await;

    let (status, body) = send(&app, "GET", "/api/users", Some(BOB), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");

    make_admin(&app, "alice").await;

    let (status, users) = send(&app, "GET", "/api/users", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["count"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/collections/newsletter",
        Some(ALICE),
        Some(json!({ "email": "reader@mail.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["collection"], "newsletter");

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/collections/jobs",
        Some(ALICE),
        Some(json!({ "title": "sneaky" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_updates_profile() {
    let app = test_app(None);
    sign_up(&app, ALICE).await;

    let request = Request::builder()
        .method("PUT")
        .uri("/api/uploads/resume/my%20cv.pdf")
        .header(header::AUTHORIZATION, format!("Bearer {}", ALICE))
        .body(Body::from("%PDF-1.7 test"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["url"], "https://files.jobs.test/resumes/alice/my_cv.pdf");
    assert_eq!(body["contentType"], "application/pdf");
    assert_eq!(body["profileUpdated"], true);

    let (_, profile) = send(&app, "GET", "/api/users/me", Some(ALICE), None).await;
    assert_eq!(profile["resumeUrl"], "https://files.jobs.test/resumes/alice/my_cv.pdf");

    let request = Request::builder()
        .method("PUT")
        .uri("/api/uploads/resume/virus.exe")
        .header(header::AUTHORIZATION, format!("Bearer {}", ALICE))
        .body(Body::from("MZ"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_contact_form_is_stored_and_rate_limited() {
    let app = test_app(None);
    let body = json!({ "name": "Ann", "email": "ann@mail.test", "message": "Hello there" });

    let contact = |body: Value| {
        Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Forwarded-For", "203.0.113.9")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    for _ in 0..3 {
        let response = app.router.clone().oneshot(contact(body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let value: Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["emailSent"], false);
    }

    let response = app.router.clone().oneshot(contact(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "1");
}

#[tokio::test]
async fn test_contact_form_rejects_bad_email() {
    let app = test_app(None);
    let (status, body) = send(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({ "name": "Ann", "email": "not-an-email", "message": "Hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
}

#[tokio::test]
async fn test_send_email_without_mailer() {
    let app = test_app(None);
    let (status, body) = send(
        &app,
        "POST",
        "/api/send-email",
        Some(ALICE),
        Some(json!({ "to": "hr@acme.test", "subject": "Hi", "text": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "failed_precondition");
    assert_eq!(body["detail"], "Email service not configured");
}

#[tokio::test]
async fn test_send_email_through_sendgrid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "errors": [{ "message": "Invalid to address" }] })),
        )
        .mount(&server)
        .await;

    let mailer = SendGridClient::new(
        MailerConfig::new("SG.key", "noreply@jobs.test").with_api_base(server.uri()),
    )
    .unwrap();
    let app = test_app(Some(mailer));
    let message = json!({ "to": "hr@acme.test", "subject": "Hi", "html": "<p>Hello</p>" });

    let (status, body) = send(&app, "POST", "/api/send-email", Some(ALICE), Some(message.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, "POST", "/api/send-email", Some(ALICE), Some(message)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to send email");
    assert_eq!(body["details"][0]["message"], "Invalid to address");

    let (status, body) = send(
        &app,
        "POST",
        "/api/send-email",
        Some(ALICE),
        Some(json!({ "to": "hr@acme.test", "subject": "Hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Missing required fields: to, from, subject, and at least one of text or html"
    );
}
