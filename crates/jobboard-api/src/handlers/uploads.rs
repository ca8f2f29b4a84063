//! Resume and cover letter uploads.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use jobboard_firestore::{FirestoreError, ProfileDocument};
use jobboard_storage::{content_type_for, document_key, UploadKind};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// Point the caller's profile at the uploaded file.
    #[serde(default = "default_true")]
    pub update_profile: bool,
}

impl Default for UploadQuery {
    fn default() -> Self {
        Self {
            update_profile: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub content_type: String,
    pub size: usize,
    pub profile_updated: bool,
}

fn profile_document(kind: UploadKind) -> ProfileDocument {
    match kind {
        UploadKind::Resume => ProfileDocument::Resume,
        UploadKind::CoverLetter => ProfileDocument::CoverLetter,
    }
}

/// Store the request body under the caller's prefix and return its public URL.
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, filename)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let kind = UploadKind::from_path_segment(&kind).ok_or_else(|| {
        ApiError::bad_request("Upload kind must be 'resume' or 'cover-letter'")
    })?;
    if body.is_empty() {
        return Err(ApiError::bad_request("Upload body is empty"));
    }

    let key = document_key(kind, &user.uid, &filename)?;
    let content_type = content_type_for(&filename)?;
    let size = body.len();

    let url = state.blobs.upload(&key, body.to_vec(), content_type).await?;
    metrics::record_upload(kind.prefix(), size);
    info!(uid = %user.uid, key = %key, size, "Stored upload");

    let profile_updated = if query.update_profile {
        match state
            .users
            .set_document_url(&user.uid, profile_document(kind), &url)
            .await
        {
            Ok(()) => true,
            Err(FirestoreError::NotFound(_)) => {
                warn!(uid = %user.uid, "Upload stored but caller has no profile to update");
                false
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        false
    };

    Ok(Json(UploadResponse {
        url,
        key,
        content_type: content_type.to_string(),
        size,
        profile_updated,
    }))
}
