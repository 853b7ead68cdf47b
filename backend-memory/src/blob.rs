//! In-memory `BlobStore`.
//!
//! Public URLs follow the hosted service's object path shape
//! (`…/storage/v1/object/public/{bucket}/{name}`) so URL-to-object-name
//! extraction is exercised against realistic input.

use async_trait::async_trait;
use backend_traits::blob::BlobStore;
use backend_traits::error::{BackendError, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "https://demo.storage.example.com";

pub struct MemoryBlobStore {
    base_url: String,
    buckets: RwLock<HashMap<String, HashMap<String, Bytes>>>,
    fail_removals: AtomicBool,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            buckets: RwLock::new(HashMap::new()),
            fail_removals: AtomicBool::new(false),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Make all removal calls fail until switched back off.
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// Whether an object is currently stored.
    pub async fn contains(&self, bucket: &str, name: &str) -> bool {
        self.buckets
            .read()
            .await
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(name))
    }

    /// Number of objects in a bucket.
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.len())
            .unwrap_or(0)
    }

    pub fn public_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, name
        )
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bucket: &str, name: &str, data: Bytes) -> Result<String> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), data);
        Ok(self.public_url(bucket, name))
    }

    async fn remove(&self, bucket: &str, names: &[String]) -> Result<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(BackendError::OperationFailed(
                "injected storage removal failure".to_string(),
            ));
        }
        let mut buckets = self.buckets.write().await;
        if let Some(objects) = buckets.get_mut(bucket) {
            for name in names {
                objects.remove(name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let store = MemoryBlobStore::new();
        let url = store
            .upload("music-sheets", "song.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert_eq!(
            url,
            "https://demo.storage.example.com/storage/v1/object/public/music-sheets/song.pdf"
        );
        assert!(store.contains("music-sheets", "song.pdf").await);
    }

    #[tokio::test]
    async fn test_remove_is_batch_and_ignores_missing() {
        let store = MemoryBlobStore::new();
        store
            .upload("music-sheets", "a.pdf", Bytes::from_static(b"a"))
            .await
            .unwrap();
        store
            .upload("music-sheets", "b.pdf", Bytes::from_static(b"b"))
            .await
            .unwrap();

        store
            .remove(
                "music-sheets",
                &["a.pdf".into(), "b.pdf".into(), "missing.pdf".into()],
            )
            .await
            .unwrap();
        assert_eq!(store.object_count("music-sheets").await, 0);
    }

    #[tokio::test]
    async fn test_fail_removals_knob() {
        let store = MemoryBlobStore::new();
        store.fail_removals(true);
        assert!(store
            .remove("music-sheets", &["a.pdf".into()])
            .await
            .is_err());
        store.fail_removals(false);
        assert!(store.remove("music-sheets", &["a.pdf".into()]).await.is_ok());
    }
}
