//! Blob store abstraction and an in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::public_object_url;
use crate::error::StorageResult;

/// Object storage that serves uploads from a public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object. Returns the public URL.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;

    async fn check_connectivity(&self) -> StorageResult<()>;
}

/// A stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Blob store held in memory, for tests and local development.
pub struct MemoryBlobStore {
    public_url: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        debug!("Storing {} bytes at {}", data.len(), key);
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(public_object_url(&self.public_url, key))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_upload_replaces_object() {
        let store = MemoryBlobStore::new("http://localhost:8000/files");
        let url = store
            .upload("resumes/u1/cv.pdf", b"%PDF".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8000/files/resumes/u1/cv.pdf");

        let object = store.get("resumes/u1/cv.pdf").await.unwrap();
        assert_eq!(object.content_type, "application/pdf");

        store
            .upload("resumes/u1/cv.pdf", b"plain".to_vec(), "text/plain")
            .await
            .unwrap();
        let object = store.get("resumes/u1/cv.pdf").await.unwrap();
        assert_eq!(object.data, b"plain".to_vec());
        assert_eq!(object.content_type, "text/plain");
        assert!(store.get("resumes/u2/cv.pdf").await.is_none());
    }
}
