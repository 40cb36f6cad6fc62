//! Metadata store abstraction for small string values.
//!
//! Implementations that live in a bucket shared with the blob store report
//! their key prefix so image serving can stay out of it.

use async_trait::async_trait;

use crate::error::IoError;

/// Small string values keyed by string.
///
/// Values are opaque to the store; the gallery keeps JSON in them.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, IoError>;

    async fn put(&self, key: &str, value: String) -> Result<(), IoError>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), IoError>;

    /// List all keys starting with `prefix`, sorted ascending.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, IoError>;

    /// Human-readable location of the store, for logging.
    fn identifier(&self) -> &str;

    /// Key prefix this store occupies in a bucket it shares with blobs.
    ///
    /// Blob lookups must never resolve keys under it.
    fn shared_key_prefix(&self) -> Option<&str> {
        None
    }
}
