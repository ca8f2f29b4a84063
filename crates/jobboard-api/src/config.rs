//! API configuration.

use std::time::Duration;

/// Where documents are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Cloud Firestore over REST.
    Firestore,
    /// In-process store for local development. Data is lost on restart.
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "firestore" => Some(Self::Firestore),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Contact form submissions per minute per IP
    pub contact_rate_limit_per_minute: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    pub document_store: StoreBackend,
    /// Firebase project whose ID tokens are accepted
    pub firebase_project_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            contact_rate_limit_per_minute: 5,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            document_store: StoreBackend::Firestore,
            firebase_project_id: None,
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: parsed_var("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parsed_var("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: parsed_var("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            contact_rate_limit_per_minute: parsed_var("CONTACT_RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.contact_rate_limit_per_minute),
            request_timeout: parsed_var("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: parsed_var("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            document_store: std::env::var("DOCUMENT_STORE")
                .ok()
                .and_then(|s| StoreBackend::from_str(&s))
                .unwrap_or(defaults.document_store),
            firebase_project_id: std::env::var("FIREBASE_PROJECT_ID")
                .or_else(|_| std::env::var("GCP_PROJECT_ID"))
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
