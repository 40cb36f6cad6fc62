//! In-process stores.
//!
//! These back the `memory` backend for local development and drive the
//! integration tests. Contents are lost when the process exits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::blob::{BlobMetadata, BlobObject, BlobStore, PutOptions};
use super::metadata::MetadataStore;
use crate::error::IoError;

// =============================================================================
// Blob Store
// =============================================================================

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: Option<String>,
    etag: String,
}

impl StoredBlob {
    fn metadata(&self, key: &str) -> BlobMetadata {
        BlobMetadata {
            key: key.to_string(),
            size: self.data.len() as u64,
            content_type: self.content_type.clone(),
            etag: Some(self.etag.clone()),
        }
    }
}

/// Blob store holding objects in memory.
///
/// Entity tags are the quoted hex SHA-256 of the object bytes.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Whether an object exists under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

fn compute_etag(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(data)))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> Result<(), IoError> {
        let etag = compute_etag(&data);
        let blob = StoredBlob {
            data,
            content_type: options.content_type,
            etag,
        };
        self.objects.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<BlobObject>, IoError> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|blob| BlobObject {
            metadata: blob.metadata(key),
            data: blob.data.clone(),
        }))
    }

    async fn head(&self, key: &str) -> Result<Option<BlobMetadata>, IoError> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|blob| blob.metadata(key)))
    }

    async fn delete(&self, key: &str) -> Result<(), IoError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobMetadata>, IoError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, blob)| blob.metadata(key))
            .collect())
    }

    fn identifier(&self) -> &str {
        "memory://blobs"
    }
}

// =============================================================================
// Metadata Store
// =============================================================================

/// Metadata store holding values in memory.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), IoError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), IoError> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, IoError> {
        let values = self.values.read().await;
        Ok(values
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn identifier(&self) -> &str {
        "memory://metadata"
    }
}
