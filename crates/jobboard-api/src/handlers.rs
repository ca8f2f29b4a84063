//! Request handlers.

pub mod admin;
pub mod applications;
pub mod contact;
pub mod email;
pub mod health;
pub mod jobs;
pub mod uploads;
pub mod users;

pub use health::*;

use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_document_id;

/// Reject path IDs that cannot name a document.
pub(crate) fn document_id(id: &str) -> ApiResult<&str> {
    if is_valid_document_id(id) {
        Ok(id)
    } else {
        Err(ApiError::bad_request("Invalid document ID"))
    }
}
