//! Blob Storage Abstraction
//!
//! Trait for the hosted object store holding the sheet PDFs. Objects live
//! under a named bucket and are addressed by object name; uploads yield a
//! public URL that is persisted in catalog rows.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Bucket-scoped object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload an object and return its public URL.
    ///
    /// Uploading to an existing name overwrites the object.
    async fn upload(&self, bucket: &str, name: &str, data: Bytes) -> Result<String>;

    /// Remove a batch of objects by name.
    ///
    /// Names that do not exist are ignored; the call fails only on a
    /// store-level error.
    async fn remove(&self, bucket: &str, names: &[String]) -> Result<()>;
}
