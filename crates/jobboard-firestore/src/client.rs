//! Firestore REST API client.
//!
//! - Token caching with refresh margin
//! - One re-authentication retry when the access token has expired
//! - Transient-failure retry with backoff and jitter for reads
//! - Tracing span and metrics per request

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_request;
use crate::retry::RetryConfig;
use crate::store::DocumentStore;
use crate::token_cache::TokenCache;
use crate::types::{
    CommitRequest, Document, FromFirestoreValue, RunAggregationQueryRequest, RunAggregationQueryResponse,
    RunQueryRequest, RunQueryResponse, StructuredAggregationQuery, StructuredQuery, Value, Write,
    COUNT_ALIAS,
};

const DEFAULT_API_ROOT: &str = "https://firestore.googleapis.com";

/// Bearer token the Firestore emulator accepts for admin access.
const EMULATOR_TOKEN: &str = "owner";

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Scheme and host of the REST API.
    pub api_root: String,
    /// Set when talking to a local emulator; disables service-account auth.
    pub emulator_host: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST")
            .ok()
            .filter(|h| !h.is_empty());

        let api_root = match &emulator_host {
            Some(host) => format!("http://{}", host),
            None => DEFAULT_API_ROOT.to_string(),
        };

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            api_root,
            emulator_host,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }

    /// Resource prefix shared by every document name.
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl FirestoreClient {
    /// Create a client, authenticating with the service account (or the emulator token).
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let token_cache = if config.emulator_host.is_some() {
            TokenCache::fixed(EMULATOR_TOKEN)
        } else {
            TokenCache::new(Self::create_auth_provider()?)
        };
        Self::with_token_cache(config, token_cache)
    }

    /// Create a client with an explicit token source.
    pub fn with_token_cache(config: FirestoreConfig, token_cache: TokenCache) -> FirestoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobboard-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let base_url = format!(
            "{}/v1/{}",
            config.api_root.trim_end_matches('/'),
            config.documents_root()
        );

        Ok(Self {
            http,
            config,
            base_url,
            token_cache: Arc::new(token_cache),
        })
    }

    fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    /// URL of a `:method` call on the parent document (or database root).
    fn parent_method_url(&self, parent: &str, method: &str) -> String {
        if parent.is_empty() {
            format!("{}:{}", self.base_url, method)
        } else {
            format!("{}/{}:{}", self.base_url, parent, method)
        }
    }

    /// Send a request, re-authenticating once if the cached token was rejected as expired.
    async fn send_authorized<F>(&self, build: F) -> FirestoreResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(FirestoreError::from_http_status(401, body));
        }

        self.token_cache.invalidate().await;
        let token = self.token_cache.get_token().await?;
        Ok(build(&token).send().await?)
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Get a document.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = format!("{}/{}", self.collection_url(collection), doc_id);

        self.with_retry("get_document", || {
            self.execute_request("get_document", collection, Some(doc_id), async {
                let response = self
                    .send_authorized(|token| self.http.get(&url).bearer_auth(token))
                    .await?;

                match response.status() {
                    StatusCode::OK => Ok(Some(response.json().await?)),
                    StatusCode::NOT_FOUND => Ok(None),
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    /// Create a document; `doc_id = None` lets Firestore generate one.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = match doc_id {
            Some(id) => format!(
                "{}?documentId={}",
                self.collection_url(collection),
                urlencoding::encode(id)
            ),
            None => self.collection_url(collection),
        };
        let body = Document::new(fields);

        self.execute_request("create_document", collection, doc_id, async {
            let response = self
                .send_authorized(|token| self.http.post(&url).bearer_auth(token).json(&body))
                .await?;

            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection,
                    doc_id.unwrap_or_default()
                ))),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Overwrite a document's fields, creating it if needed.
    pub async fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = format!("{}/{}", self.collection_url(collection), doc_id);
        let body = Document::new(fields);

        self.execute_request("set_document", collection, Some(doc_id), async {
            let response = self
                .send_authorized(|token| self.http.patch(&url).bearer_auth(token).json(&body))
                .await?;

            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    /// Run a structured query against a collection under `parent`.
    ///
    /// `parent` is the document path that owns the collection, e.g. `jobs/abc`
    /// for `jobs/abc/applications`, or `""` for top-level collections.
    pub async fn run_query(
        &self,
        parent: &str,
        query: StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        let url = self.parent_method_url(parent, "runQuery");
        let request = RunQueryRequest {
            structured_query: query,
        };
        let collection = request.structured_query.collection_id().to_string();

        self.with_retry("run_query", || {
            self.execute_request("run_query", &collection, None, async {
                let response = self
                    .send_authorized(|token| self.http.post(&url).bearer_auth(token).json(&request))
                    .await?;

                match response.status() {
                    StatusCode::OK => {
                        let body = response.text().await.unwrap_or_default();
                        let responses: Vec<RunQueryResponse> = serde_json::from_str(&body)
                            .map_err(|e| {
                                FirestoreError::InvalidResponse(format!(
                                    "Failed to parse runQuery response: {} (body prefix: {})",
                                    e,
                                    body.chars().take(200).collect::<String>()
                                ))
                            })?;
                        Ok(responses.into_iter().filter_map(|r| r.document).collect())
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    /// Count the documents a query matches with a server-side aggregation.
    pub async fn count(&self, parent: &str, query: StructuredQuery) -> FirestoreResult<u64> {
        let url = self.parent_method_url(parent, "runAggregationQuery");
        let collection = query.collection_id().to_string();
        let request = RunAggregationQueryRequest {
            structured_aggregation_query: StructuredAggregationQuery::count(query),
        };

        self.with_retry("count", || {
            self.execute_request("count", &collection, None, async {
                let response = self
                    .send_authorized(|token| self.http.post(&url).bearer_auth(token).json(&request))
                    .await?;

                match response.status() {
                    StatusCode::OK => {
                        let responses: Vec<RunAggregationQueryResponse> = response.json().await?;
                        let count = responses
                            .iter()
                            .filter_map(|r| r.result.as_ref())
                            .filter_map(|r| r.aggregate_fields.as_ref())
                            .find_map(|fields| fields.get(COUNT_ALIAS))
                            .and_then(u64::from_firestore_value)
                            .ok_or_else(|| {
                                FirestoreError::InvalidResponse(
                                    "Aggregation response has no count".to_string(),
                                )
                            })?;
                        Ok(count)
                    }
                    status => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
        })
        .await
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Build full document name for writes and cursors.
    pub fn full_document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_root(), collection, doc_id)
    }

    /// Apply writes atomically. Never retried: a write may have landed before a timeout.
    pub async fn commit(&self, writes: Vec<Write>) -> FirestoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        if writes.len() > 500 {
            return Err(FirestoreError::invalid_argument(
                "Commit exceeds 500 write limit",
            ));
        }

        let url = format!("{}:commit", self.base_url);
        let request = CommitRequest { writes };

        self.execute_request("commit", "commit", None, async {
            let response = self
                .send_authorized(|token| self.http.post(&url).bearer_auth(token).json(&request))
                .await?;

            match response.status() {
                StatusCode::OK => Ok(()),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Execute with retry.
    pub async fn with_retry<T, F, Fut>(&self, operation: &str, op: F) -> FirestoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FirestoreResult<T>>,
    {
        crate::retry::with_retry(&self.config.retry, operation, op).await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = match doc_id {
            Some(id) => info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id),
            None => info_span!("firestore_request", operation = %operation, collection = %collection),
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        FirestoreClient::get_document(self, collection, doc_id).await
    }

    async fn create_document(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        FirestoreClient::create_document(self, collection, doc_id, fields).await
    }

    async fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        FirestoreClient::set_document(self, collection, doc_id, fields).await
    }

    async fn run_query(
        &self,
        parent: &str,
        query: StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        FirestoreClient::run_query(self, parent, query).await
    }

    async fn count(&self, parent: &str, query: StructuredQuery) -> FirestoreResult<u64> {
        FirestoreClient::count(self, parent, query).await
    }

    async fn commit(&self, writes: Vec<Write>) -> FirestoreResult<()> {
        FirestoreClient::commit(self, writes).await
    }

    fn document_name(&self, collection: &str, doc_id: &str) -> String {
        self.full_document_name(collection, doc_id)
    }
}
