//! Tests for Firestore client functionality.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{header, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{FirestoreClient, FirestoreConfig};
use crate::error::FirestoreError;
use crate::retry::RetryConfig;
use crate::store::DocumentStore;
use crate::token_cache::TokenCache;
use crate::types::{
    Filter, FieldTransform, Precondition, StructuredQuery, ToFirestoreValue, Write,
};

// =============================================================================
// Test Helpers
// =============================================================================

const DOCS_PATH: &str = r"^/v1/projects/test-project/databases/\(default\)/documents";

fn test_config(api_root: &str) -> FirestoreConfig {
    FirestoreConfig {
        project_id: "test-project".to_string(),
        database_id: "(default)".to_string(),
        api_root: api_root.to_string(),
        emulator_host: None,
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

fn client_for(server: &MockServer) -> FirestoreClient {
    FirestoreClient::with_token_cache(test_config(&server.uri()), TokenCache::fixed("test-token"))
        .unwrap()
}

fn docs_path(suffix: &str) -> String {
    format!("{}{}$", DOCS_PATH, suffix)
}

fn job_json(id: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/test-project/databases/(default)/documents/jobs/{}", id),
        "fields": {
            "title": {"stringValue": "Barista"},
            "applicantCount": {"integerValue": "2"}
        },
        "createTime": "2024-05-01T10:00:00.000000Z",
        "updateTime": "2024-05-01T10:00:00.000000Z"
    })
}

// =============================================================================
// Document Operations
// =============================================================================

#[tokio::test]
async fn test_get_document_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(docs_path(r"/jobs/job-1")))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job-1")))
        .expect(1)
        .mount(&server)
        .await;

    let doc = client_for(&server)
        .get_document("jobs", "job-1")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(doc.id(), Some("job-1"));
    assert_eq!(doc.field("title"), Some(&"Barista".to_firestore_value()));
    assert_eq!(doc.update_time.as_deref(), Some("2024-05-01T10:00:00.000000Z"));
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("NOT_FOUND"))
        .mount(&server)
        .await;

    let doc = client_for(&server).get_document("jobs", "nope").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn test_get_document_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("UNAVAILABLE"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job-1")))
        .mount(&server)
        .await;

    let doc = client_for(&server).get_document("jobs", "job-1").await.unwrap();
    assert!(doc.is_some());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"error":{"status":"UNAUTHENTICATED","message":"ACCESS_TOKEN_EXPIRED"}}"#),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job-1")))
        .mount(&server)
        .await;

    let doc = client_for(&server).get_document("jobs", "job-1").await.unwrap();
    assert!(doc.is_some());
}

#[tokio::test]
async fn test_create_document_with_id_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path("/users")))
        .and(query_param("documentId", "uid-1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("ALREADY_EXISTS"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_document("users", Some("uid-1"), HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FirestoreError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_create_document_with_generated_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path("/jobs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("generated")))
        .mount(&server)
        .await;

    let doc = client_for(&server)
        .create_document("jobs", None, HashMap::new())
        .await
        .unwrap();
    assert_eq!(doc.id(), Some("generated"));
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_run_query_under_parent_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path("/jobs/job-1:runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": job_json("a"), "readTime": "2024-05-01T10:00:00Z"},
            {"readTime": "2024-05-01T10:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let query = StructuredQuery::collection("applications")
        .filter(Filter::equal("userId", "u1".to_firestore_value()));
    let docs = client_for(&server).run_query("jobs/job-1", query).await.unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn test_run_query_at_root_sends_structured_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path(":runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let query = StructuredQuery::collection("jobs").limit(3);
    let docs = client_for(&server).run_query("", query).await.unwrap();
    assert!(docs.is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["structuredQuery"]["from"][0]["collectionId"], "jobs");
    assert_eq!(body["structuredQuery"]["limit"], 3);
}

#[tokio::test]
async fn test_count_reads_aggregate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path(":runAggregationQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "result": {"aggregateFields": {"count": {"integerValue": "42"}}},
            "readTime": "2024-05-01T10:00:00Z"
        }])))
        .mount(&server)
        .await;

    let count = client_for(&server)
        .count("", StructuredQuery::collection("jobs"))
        .await
        .unwrap();
    assert_eq!(count, 42);
}

// =============================================================================
// Commit
// =============================================================================

#[tokio::test]
async fn test_commit_serializes_transforms_and_preconditions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path(":commit")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{"updateTime": "2024-05-01T10:00:01Z"}],
            "commitTime": "2024-05-01T10:00:01Z"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let name = client.full_document_name("jobs", "job-1");
    let write = Write::transform(
        name.clone(),
        vec![
            FieldTransform::increment("views", 1),
            FieldTransform::append_missing("applicants", vec!["u1".to_firestore_value()]),
        ],
    )
    .with_precondition(Precondition::update_time("2024-05-01T10:00:00.000000Z"));
    client.commit(vec![write]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = &body["writes"][0];
    assert_eq!(sent["update"]["name"], name);
    assert_eq!(sent["updateMask"]["fieldPaths"], json!([]));
    assert_eq!(sent["updateTransforms"][0]["increment"]["integerValue"], "1");
    assert_eq!(
        sent["updateTransforms"][1]["appendMissingElements"]["values"][0]["stringValue"],
        "u1"
    );
    assert_eq!(sent["currentDocument"]["updateTime"], "2024-05-01T10:00:00.000000Z");
}

#[tokio::test]
async fn test_commit_precondition_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(docs_path(":commit")))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":{"status":"FAILED_PRECONDITION"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let write = Write::transform(client.full_document_name("jobs", "x"), vec![]);
    let err = client.commit(vec![write]).await.unwrap_err();
    assert!(err.is_precondition_failed());
}

#[tokio::test]
async fn test_commit_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let write = Write::transform(client.full_document_name("jobs", "x"), vec![]);
    let err = client.commit(vec![write]).await.unwrap_err();
    assert!(matches!(err, FirestoreError::ServerError(503, _)));
}

#[tokio::test]
async fn test_document_name_matches_config() {
    let client =
        FirestoreClient::with_token_cache(test_config("http://localhost"), TokenCache::fixed("t"))
            .unwrap();
    assert_eq!(
        DocumentStore::document_name(&client, "jobs/j1/applications", "u1"),
        "projects/test-project/databases/(default)/documents/jobs/j1/applications/u1"
    );
}

// =============================================================================
// Config Tests
// =============================================================================

fn clear_env() {
    for key in [
        "GCP_PROJECT_ID",
        "FIREBASE_PROJECT_ID",
        "FIRESTORE_EMULATOR_HOST",
        "FIRESTORE_CONNECT_TIMEOUT_SECS",
        "FIRESTORE_RETRY_BASE_MS",
        "FIRESTORE_RETRY_MAX_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_config_validates_empty_project_id() {
    clear_env();
    std::env::set_var("GCP_PROJECT_ID", "");
    let result = FirestoreConfig::from_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_config_accepts_firebase_project_id() {
    clear_env();
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "firebase-project");
    assert_eq!(config.api_root, "https://firestore.googleapis.com");
}

#[test]
#[serial]
fn test_config_prefers_gcp_project_id() {
    clear_env();
    std::env::set_var("GCP_PROJECT_ID", "gcp-project");
    std::env::set_var("FIREBASE_PROJECT_ID", "firebase-project");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.project_id, "gcp-project");
}

#[test]
#[serial]
fn test_config_uses_emulator_host() {
    clear_env();
    std::env::set_var("GCP_PROJECT_ID", "demo");
    std::env::set_var("FIRESTORE_EMULATOR_HOST", "localhost:8080");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.api_root, "http://localhost:8080");
    assert_eq!(config.emulator_host.as_deref(), Some("localhost:8080"));
    clear_env();
}

#[test]
#[serial]
fn test_config_parses_retry_env_vars() {
    clear_env();
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_RETRY_BASE_MS", "50");
    std::env::set_var("FIRESTORE_RETRY_MAX_MS", "2000");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.retry.base_delay_ms, 50);
    assert_eq!(config.retry.max_delay_ms, 2000);
    clear_env();
}

#[test]
#[serial]
fn test_config_handles_invalid_env_values() {
    clear_env();
    std::env::set_var("GCP_PROJECT_ID", "test");
    std::env::set_var("FIRESTORE_CONNECT_TIMEOUT_SECS", "not-a-number");
    let config = FirestoreConfig::from_env().unwrap();
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    clear_env();
}
