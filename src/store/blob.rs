//! Blob store abstraction for raw image bytes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Options applied when writing a blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// MIME type stored alongside the object
    pub content_type: Option<String>,

    /// Cache-Control directive stored alongside the object
    pub cache_control: Option<String>,
}

impl PutOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            cache_control: None,
        }
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }
}

/// Metadata describing a stored blob without its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

/// A blob fetched together with its bytes.
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub metadata: BlobMetadata,
    pub data: Bytes,
}

/// Raw byte storage keyed by string.
///
/// Missing objects are reported as `Ok(None)` from `get`/`head` rather than
/// as errors; only genuine store failures produce `Err`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> Result<(), IoError>;

    /// Fetch an object and its metadata.
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, IoError>;

    /// Fetch only the metadata of an object.
    async fn head(&self, key: &str) -> Result<Option<BlobMetadata>, IoError>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), IoError>;

    /// List all objects whose key starts with `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobMetadata>, IoError>;

    /// Human-readable location of the store, for logging.
    fn identifier(&self) -> &str;
}
