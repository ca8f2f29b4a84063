//! Contact form submissions and admin-written collections.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use jobboard_models::contact::CONTACT_FORM_TYPE;
use jobboard_models::{ContactSubmission, StoredSubmission, SubmissionStatus};

use crate::error::{FirestoreError, FirestoreResult};
use crate::job_repo::JOBS_COLLECTION;
use crate::store::DocumentStore;
use crate::types::{ToFirestoreValue, Value};
use crate::user_repo::USERS_COLLECTION;

/// Collection holding contact form submissions.
pub const CONTACT_COLLECTION: &str = "store";

const MAX_COLLECTION_NAME_LEN: usize = 64;

/// Collections owned by the typed repositories; not writable as free-form data.
const RESERVED_COLLECTIONS: &[&str] = &[JOBS_COLLECTION, USERS_COLLECTION];

#[derive(Clone)]
pub struct ContactRepository {
    store: Arc<dyn DocumentStore>,
}

impl ContactRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a submission with status `new`.
    pub async fn save_contact_submission(
        &self,
        submission: ContactSubmission,
    ) -> FirestoreResult<StoredSubmission> {
        submission
            .validate()
            .map_err(FirestoreError::InvalidArgument)?;

        let timestamp = Utc::now();
        let status = SubmissionStatus::New;

        let mut fields = HashMap::new();
        fields.insert("name".to_string(), submission.name.to_firestore_value());
        fields.insert("email".to_string(), submission.email.to_firestore_value());
        fields.insert("message".to_string(), submission.message.to_firestore_value());
        fields.insert("timestamp".to_string(), timestamp.to_firestore_value());
        fields.insert("status".to_string(), status.as_str().to_firestore_value());
        fields.insert("type".to_string(), CONTACT_FORM_TYPE.to_firestore_value());

        let doc = self
            .store
            .create_document(CONTACT_COLLECTION, None, fields)
            .await?;
        let id = doc.id().unwrap_or_default().to_string();

        info!(submission_id = %id, "Saved contact submission");
        Ok(StoredSubmission {
            id,
            submission,
            timestamp,
            status,
        })
    }

    /// Store a JSON object in a free-form top-level collection, stamped with `timestamp`.
    pub async fn add_document(
        &self,
        collection: &str,
        data: &serde_json::Value,
    ) -> FirestoreResult<String> {
        validate_collection_name(collection)?;

        let object = data.as_object().ok_or_else(|| {
            FirestoreError::invalid_argument("Document data must be a JSON object")
        })?;

        let mut fields: HashMap<String, Value> = object
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect();
        fields.insert("timestamp".to_string(), Utc::now().to_firestore_value());

        let doc = self.store.create_document(collection, None, fields).await?;
        let id = doc.id().unwrap_or_default().to_string();

        info!(collection = %collection, doc_id = %id, "Added document");
        Ok(id)
    }
}

pub fn validate_collection_name(name: &str) -> FirestoreResult<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if name.is_empty() || name.len() > MAX_COLLECTION_NAME_LEN || !valid_chars {
        return Err(FirestoreError::invalid_argument(format!(
            "Invalid collection name: {:?}",
            name
        )));
    }
    if RESERVED_COLLECTIONS.contains(&name) {
        return Err(FirestoreError::invalid_argument(format!(
            "Collection {} cannot be written directly",
            name
        )));
    }
    Ok(())
}
