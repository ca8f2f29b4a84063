//! Admin handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub id: String,
    pub collection: String,
}

/// Store a JSON object in a named top-level collection.
pub async fn add_document(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(collection): Path<String>,
    Json(data): Json<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<AddDocumentResponse>)> {
    let id = state.contacts.add_document(&collection, &data).await?;

    info!(admin = %admin.uid, collection = %collection, doc_id = %id, "Admin added document");
    Ok((
        StatusCode::CREATED,
        Json(AddDocumentResponse { id, collection }),
    ))
}
