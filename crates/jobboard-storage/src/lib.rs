//! Cloudflare R2 storage for user-uploaded documents.
//!
//! This crate provides:
//! - A `BlobStore` trait with R2 and in-memory implementations
//! - Object keys for resumes and cover letters
//! - File name sanitizing and content type detection

pub mod blob;
pub mod client;
pub mod error;
pub mod keys;

pub use blob::{BlobStore, MemoryBlobStore};
pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use keys::{content_type_for, document_key, sanitize_filename, UploadKind};
