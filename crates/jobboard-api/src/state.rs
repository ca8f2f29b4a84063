//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use jobboard_firestore::{
    ContactRepository, DocumentStore, FirestoreClient, JobRepository, MemoryStore, UserRepository,
};
use jobboard_mailer::{MailerError, SendGridClient};
use jobboard_storage::{BlobStore, MemoryBlobStore, R2Client};

use crate::auth::{JwksCache, TokenVerifier};
use crate::config::{ApiConfig, StoreBackend};
use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn DocumentStore>,
    pub jobs: JobRepository,
    pub users: UserRepository,
    pub contacts: ContactRepository,
    pub blobs: Arc<dyn BlobStore>,
    /// `None` when SendGrid is not configured.
    pub mailer: Option<SendGridClient>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let project_id = config
            .firebase_project_id
            .clone()
            .ok_or("FIREBASE_PROJECT_ID or GCP_PROJECT_ID must be set")?;
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwksCache::new(project_id)?);

        let (store, blobs): (Arc<dyn DocumentStore>, Arc<dyn BlobStore>) =
            match config.document_store {
                StoreBackend::Firestore => (
                    Arc::new(FirestoreClient::from_env().await?),
                    Arc::new(R2Client::from_env().await?),
                ),
                StoreBackend::Memory => {
                    warn!("Using in-memory document and blob stores; data is not persisted");
                    let public_url = format!("http://localhost:{}/uploads", config.port);
                    (
                        Arc::new(MemoryStore::new()),
                        Arc::new(MemoryBlobStore::new(public_url)),
                    )
                }
            };

        let mailer = match SendGridClient::from_env() {
            Ok(client) => {
                info!("SendGrid email enabled");
                Some(client)
            }
            Err(MailerError::NotConfigured(_)) => {
                warn!("SENDGRID_API_KEY or SENDGRID_FROM_EMAIL not set; email endpoints disabled");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::from_parts(config, store, blobs, mailer, verifier))
    }

    /// Assemble state from already-built clients.
    pub fn from_parts(
        config: ApiConfig,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        mailer: Option<SendGridClient>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            config,
            jobs: JobRepository::new(Arc::clone(&store)),
            users: UserRepository::new(Arc::clone(&store)),
            contacts: ContactRepository::new(Arc::clone(&store)),
            store,
            blobs,
            mailer,
            verifier,
        }
    }

    pub fn mailer(&self) -> ApiResult<&SendGridClient> {
        self.mailer
            .as_ref()
            .ok_or_else(|| ApiError::Mailer(MailerError::not_configured()))
    }
}
