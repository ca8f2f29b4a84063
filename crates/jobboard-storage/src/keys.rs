//! Object keys and content types for uploaded documents.

use std::fmt;

use crate::error::{StorageError, StorageResult};

/// Longest file name kept after sanitizing.
const MAX_FILENAME_LEN: usize = 128;

/// Kind of document a user can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    CoverLetter,
}

impl UploadKind {
    /// Key prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            UploadKind::Resume => "resumes",
            UploadKind::CoverLetter => "cover-letters",
        }
    }

    /// Parse the path segment used by the upload route.
    pub fn from_path_segment(s: &str) -> Option<Self> {
        match s {
            "resume" | "resumes" => Some(UploadKind::Resume),
            "cover-letter" | "cover-letters" => Some(UploadKind::CoverLetter),
            _ => None,
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`.
///
/// Path components are dropped, other characters become `_`, and leading
/// dots are stripped so the result can never traverse or hide.
pub fn sanitize_filename(name: &str) -> StorageResult<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return Err(StorageError::InvalidKey(format!(
            "File name {:?} has no usable characters",
            name
        )));
    }

    Ok(cleaned.chars().take(MAX_FILENAME_LEN).collect())
}

/// Content type for an accepted document extension.
pub fn content_type_for(filename: &str) -> StorageResult<&'static str> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok("application/pdf"),
        "doc" => Ok("application/msword"),
        "docx" => Ok("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "txt" => Ok("text/plain"),
        _ => Err(StorageError::UnsupportedFileType(format!(
            "{} (accepted: pdf, doc, docx, txt)",
            filename
        ))),
    }
}

/// `{prefix}/{user_id}/{sanitized file name}`.
pub fn document_key(kind: UploadKind, user_id: &str, filename: &str) -> StorageResult<String> {
    if user_id.is_empty() || user_id.contains('/') {
        return Err(StorageError::InvalidKey(format!("Invalid user id {:?}", user_id)));
    }
    Ok(format!(
        "{}/{}/{}",
        kind.prefix(),
        user_id,
        sanitize_filename(filename)?
    ))
}
