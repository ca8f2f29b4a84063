//! Document store abstraction shared by the REST client and the in-memory store.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::FirestoreResult;
use crate::types::{Document, StructuredQuery, Value, Write};

/// Keyed document collections with structured queries and atomic commits.
///
/// Collection paths are relative to the database root (`jobs`,
/// `jobs/{jobId}/applications`). Query parents are the document path that
/// owns the queried collection, or `""` for top-level collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` when it does not exist.
    async fn get_document(&self, collection: &str, doc_id: &str)
        -> FirestoreResult<Option<Document>>;

    /// Insert a new document. `None` lets the store generate the ID.
    /// Fails with `AlreadyExists` when the ID is taken.
    async fn create_document(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document>;

    /// Replace the document's fields, creating it when missing.
    async fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document>;

    async fn run_query(&self, parent: &str, query: StructuredQuery)
        -> FirestoreResult<Vec<Document>>;

    /// Number of documents the query matches.
    async fn count(&self, parent: &str, query: StructuredQuery) -> FirestoreResult<u64>;

    /// Apply all writes atomically. Any failed precondition rejects the whole commit.
    async fn commit(&self, writes: Vec<Write>) -> FirestoreResult<()>;

    /// Full resource name of a document.
    fn document_name(&self, collection: &str, doc_id: &str) -> String;
}
