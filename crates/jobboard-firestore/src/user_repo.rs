//! Repository for user profiles (`users/{uid}`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use jobboard_models::{NewUserProfile, UserProfile};

use crate::codec::{document_to_user, fields, user_to_fields};
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::DocumentStore;
use crate::types::{
    FieldTransform, Precondition, StructuredQuery, ToFirestoreValue, Write, DESCENDING,
};

pub const USERS_COLLECTION: &str = "users";

const USER_NOT_FOUND: &str = "User profile not found";

/// Uploaded documents referenced from a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileDocument {
    Resume,
    CoverLetter,
}

impl ProfileDocument {
    fn field(&self) -> &'static str {
        match self {
            ProfileDocument::Resume => fields::RESUME_URL,
            ProfileDocument::CoverLetter => fields::COVER_LETTER_URL,
        }
    }
}

/// Repository for user profile documents.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write the profile for `uid`, replacing any existing document. Returns `uid`.
    pub async fn create_user_document(
        &self,
        uid: &str,
        profile: NewUserProfile,
    ) -> FirestoreResult<String> {
        profile.validate().map_err(FirestoreError::InvalidArgument)?;

        let profile = profile.into_profile(uid, Utc::now());
        self.store
            .set_document(USERS_COLLECTION, uid, user_to_fields(&profile))
            .await?;

        info!(uid = %uid, "Created user profile");
        Ok(uid.to_string())
    }

    pub async fn get_user_profile(&self, uid: &str) -> FirestoreResult<UserProfile> {
        let doc = self
            .store
            .get_document(USERS_COLLECTION, uid)
            .await?
            .ok_or_else(|| FirestoreError::not_found(USER_NOT_FOUND))?;
        document_to_user(&doc)
    }

    /// Every profile, newest first.
    pub async fn get_all_users(&self) -> FirestoreResult<Vec<UserProfile>> {
        let query = StructuredQuery::collection(USERS_COLLECTION)
            .order_by(fields::CREATED_AT, DESCENDING);
        let docs = self.store.run_query("", query).await?;

        Ok(docs
            .iter()
            .filter_map(|doc| match document_to_user(doc) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(doc = ?doc.name, "Skipping malformed user document: {}", e);
                    None
                }
            })
            .collect())
    }

    /// Point the profile at a newly uploaded document.
    pub async fn set_document_url(
        &self,
        uid: &str,
        kind: ProfileDocument,
        url: &str,
    ) -> FirestoreResult<()> {
        let field = kind.field();
        let mut updates = HashMap::new();
        updates.insert(field.to_string(), url.to_firestore_value());

        let write = Write::update(
            self.store.document_name(USERS_COLLECTION, uid),
            updates,
            Some(vec![field.to_string()]),
        )
        .with_transforms(vec![FieldTransform::request_time(fields::UPDATED_AT)])
        .with_precondition(Precondition::exists(true));

        match self.store.commit(vec![write]).await {
            Ok(()) => {
                info!(uid = %uid, field = %field, "Updated profile document URL");
                Ok(())
            }
            Err(FirestoreError::NotFound(_)) => Err(FirestoreError::not_found(USER_NOT_FOUND)),
            Err(e) => Err(e),
        }
    }
}
