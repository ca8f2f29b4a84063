//! Document store gateway and repositories for the job board.
//!
//! This crate provides:
//! - A `DocumentStore` trait with a Firestore REST implementation and an in-memory one
//! - Typed repositories for jobs, applications, users and contact submissions
//! - Job search (store-side equality filters plus in-memory residual filters)
//! - Cursor pagination and the cross-job application listing
//! - Service account authentication via gcp_auth, retries and request metrics

pub mod aggregation;
pub mod client;
pub mod codec;
pub mod contact_repo;
pub mod error;
pub mod job_repo;
pub mod memory;
pub mod metrics;
pub mod pagination;
pub mod retry;
pub mod search;
pub mod store;
pub mod token_cache;
pub mod types;
pub mod user_repo;

#[cfg(test)]
mod client_tests;

pub use client::{FirestoreClient, FirestoreConfig};
pub use contact_repo::ContactRepository;
pub use error::{FirestoreError, FirestoreResult};
pub use job_repo::JobRepository;
pub use memory::MemoryStore;
pub use retry::RetryConfig;
pub use store::DocumentStore;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
pub use user_repo::{ProfileDocument, UserRepository};
