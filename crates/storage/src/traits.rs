//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Object store abstraction for uploaded media and JSON documents.
///
/// Keys are `/`-separated relative paths such as `photos/1717243200123-ab12.jpg`.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Get an object's size without fetching content.
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Get an object's content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Get an object as a byte stream.
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Put an object atomically, replacing any previous content.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object. Returns `NotFound` if it does not exist.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the name of this storage backend (e.g., "s3", "filesystem").
    /// Used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// Called during startup and by the health endpoint. The default
    /// implementation returns Ok(()).
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Metadata about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time (if available).
    pub last_modified: Option<time::OffsetDateTime>,
    /// Content type (if available).
    pub content_type: Option<String>,
}
