//! Gallery Service orchestrating both stores.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        GalleryService                           │
//! │                                                                 │
//! │  upload()        1. write blob      4. append to group list     │
//! │                  2. verify readback 5. append to index          │
//! │                  3. write record                                │
//! │                                                                 │
//! │  delete_image()  blob → record → group list → index             │
//! │  delete_group()  (blob → record)* → prune group list → index    │
//! │  list_images()   index → records → sort newest first            │
//! │  list_groups()   scan `group:` keys                             │
//! │  fetch_image()   candidate keys → first hit                     │
//! └──────────┬──────────────────────────────────┬───────────────────┘
//!            ▼                                  ▼
//!     ┌────────────┐                    ┌───────────────┐
//!     │ BlobStore  │                    │ MetadataStore │
//!     └────────────┘                    └───────────────┘
//! ```
//!
//! Every operation is a linear sequence of store calls with no rollback. A
//! failure part way through is returned to the caller and leaves whatever
//! was already written in place.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::GalleryError;
use crate::store::{BlobObject, BlobStore, MetadataStore, PutOptions};

use super::locks::KeyLocks;
use super::naming::{
    candidate_keys, derive_extension, generate_id, resolve_content_type, storage_key,
};
use super::record::{
    group_key, image_key, normalize_group, ImageRecord, GROUP_KEY_PREFIX, INDEX_KEY,
};

/// Cache directive stored with uploaded image bytes.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

// =============================================================================
// Upload Payloads
// =============================================================================

/// A file part of an upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }

    /// A browser submits an empty, unnamed part when no file was chosen.
    fn is_empty_selection(&self) -> bool {
        self.data.is_empty() && self.file_name.as_deref().map_or(true, str::is_empty)
    }
}

/// One `images` part of an upload form.
#[derive(Debug, Clone)]
pub enum UploadPayload {
    /// A file part
    File(UploadFile),
    /// A plain form value where a file was expected
    Value(String),
}

// =============================================================================
// Gallery Service
// =============================================================================

/// Image gallery operations over a blob store and a metadata store.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use gallery_server::gallery::GalleryService;
/// use gallery_server::store::{MemoryBlobStore, MemoryMetadataStore};
///
/// let service = GalleryService::new(
///     Arc::new(MemoryBlobStore::new()),
///     Arc::new(MemoryMetadataStore::new()),
/// );
/// let images = service.list_images().await?;
/// ```
pub struct GalleryService {
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    locks: KeyLocks,
}

impl GalleryService {
    pub fn new(blobs: Arc<dyn BlobStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            metadata,
            locks: KeyLocks::new(),
        }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    // -------------------------------------------------------------------------
    // Upload
    // -------------------------------------------------------------------------

    /// Store every file payload under `group` and return the new records.
    ///
    /// Non-file payloads are skipped. Returns [`GalleryError::NoFiles`]
    /// without touching either store when nothing is left to upload.
    pub async fn upload(
        &self,
        group: Option<&str>,
        payloads: Vec<UploadPayload>,
    ) -> Result<Vec<ImageRecord>, GalleryError> {
        let group = normalize_group(group);

        let files: Vec<UploadFile> = payloads
            .into_iter()
            .filter_map(|payload| match payload {
                UploadPayload::File(file) if !file.is_empty_selection() => Some(file),
                UploadPayload::File(_) => {
                    debug!("Skipping empty file selection");
                    None
                }
                UploadPayload::Value(_) => {
                    debug!("Skipping non-file upload payload");
                    None
                }
            })
            .collect();

        if files.is_empty() {
            return Err(GalleryError::NoFiles);
        }

        let mut records = Vec::with_capacity(files.len());
        for (index, file) in files.into_iter().enumerate() {
            let record = self.store_file(&group, index, file).await?;
            records.push(record);
        }

        info!(group = %group, count = records.len(), "Upload complete");
        Ok(records)
    }

    async fn store_file(
        &self,
        group: &str,
        index: usize,
        file: UploadFile,
    ) -> Result<ImageRecord, GalleryError> {
        let uploaded_at = Utc::now();
        let id = generate_id(uploaded_at, index);
        let extension = derive_extension(file.file_name.as_deref(), file.content_type.as_deref());
        let key = storage_key(&id, &extension);
        let content_type = resolve_content_type(file.content_type.as_deref(), &key);

        let options =
            PutOptions::new(content_type.clone()).with_cache_control(IMMUTABLE_CACHE_CONTROL);
        self.blobs.put(&key, file.data, options).await?;

        let size = match self.blobs.head(&key).await? {
            Some(meta) if meta.size > 0 => meta.size,
            _ => return Err(GalleryError::UploadVerification { key }),
        };

        let record = ImageRecord::new(id, key, group, uploaded_at, size, content_type);
        self.write_json(&record.key(), &record).await?;

        let id = record.id.clone();
        self.update_list(&group_key(group), |ids| ids.push(id.clone()))
            .await?;
        self.update_list(INDEX_KEY, |ids| ids.push(id)).await?;

        info!(
            id = %record.id,
            key = %record.storage_key,
            size = record.size,
            "Stored image"
        );
        Ok(record)
    }

    // -------------------------------------------------------------------------
    // Listing
    // -------------------------------------------------------------------------

    /// Ids in the gallery index, in insertion order.
    pub async fn index(&self) -> Result<Vec<String>, GalleryError> {
        Ok(self.read_json(INDEX_KEY).await?.unwrap_or_default())
    }

    /// Ids stored for a group, or `None` when the group has no list.
    pub async fn group_members(&self, group: &str) -> Result<Option<Vec<String>>, GalleryError> {
        self.read_json(&group_key(group)).await
    }

    /// Look up a single record.
    pub async fn get_image(&self, id: &str) -> Result<Option<ImageRecord>, GalleryError> {
        self.read_json(&image_key(id)).await
    }

    /// All indexed images, newest first. Index entries without a record are
    /// skipped.
    pub async fn list_images(&self) -> Result<Vec<ImageRecord>, GalleryError> {
        let ids = self.index().await?;
        let mut records = Vec::with_capacity(ids.len());
        let mut seen = HashSet::with_capacity(ids.len());

        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.get_image(&id).await? {
                Some(record) => records.push(record),
                None => warn!(id = %id, "Index entry has no record"),
            }
        }

        records.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    /// Labels of every stored group, ascending.
    pub async fn list_groups(&self) -> Result<Vec<String>, GalleryError> {
        let mut groups: Vec<String> = self
            .metadata
            .list_keys(GROUP_KEY_PREFIX)
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(GROUP_KEY_PREFIX).map(str::to_string))
            .filter(|label| !label.is_empty())
            .collect();

        groups.sort();
        groups.dedup();
        Ok(groups)
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    /// Remove one image from both stores, its group list and the index.
    pub async fn delete_image(&self, id: &str) -> Result<(), GalleryError> {
        let record = self
            .get_image(id)
            .await?
            .ok_or_else(|| GalleryError::ImageNotFound { id: id.to_string() })?;

        self.blobs.delete(&record.storage_key).await?;
        self.metadata.delete(&record.key()).await?;
        self.update_list(&group_key(&record.group), |ids| ids.retain(|i| i != id))
            .await?;
        self.update_list(INDEX_KEY, |ids| ids.retain(|i| i != id))
            .await?;

        info!(id = %id, group = %record.group, "Deleted image");
        Ok(())
    }

    /// Remove every image in a group. Returns how many records were deleted.
    pub async fn delete_group(&self, group: &str) -> Result<usize, GalleryError> {
        let ids = self
            .group_members(group)
            .await?
            .ok_or_else(|| GalleryError::GroupNotFound {
                group: group.to_string(),
            })?;

        let mut deleted = 0;
        for id in &ids {
            match self.get_image(id).await? {
                Some(record) => {
                    self.blobs.delete(&record.storage_key).await?;
                    self.metadata.delete(&record.key()).await?;
                    deleted += 1;
                }
                None => warn!(id = %id, group = %group, "Group entry has no record"),
            }
        }

        // Ids appended by uploads since the members were read stay listed
        let removed: HashSet<&String> = ids.iter().collect();
        self.update_list(&group_key(group), |members| {
            members.retain(|i| !removed.contains(i))
        })
        .await?;
        self.update_list(INDEX_KEY, |index| index.retain(|i| !removed.contains(i)))
            .await?;

        info!(group = %group, deleted = deleted, "Deleted group");
        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Serving
    // -------------------------------------------------------------------------

    /// Fetch image bytes, trying each candidate key derivation in order.
    /// Keys under the metadata store's shared prefix are never served.
    pub async fn fetch_image(&self, key: &str) -> Result<BlobObject, GalleryError> {
        let reserved = self.metadata.shared_key_prefix();
        for candidate in candidate_keys(key) {
            if reserved.is_some_and(|prefix| candidate.starts_with(prefix)) {
                debug!(requested = %key, candidate = %candidate, "Skipping metadata key");
                continue;
            }
            if let Some(object) = self.blobs.get(&candidate).await? {
                if candidate != key {
                    debug!(
                        requested = %key,
                        resolved = %candidate,
                        "Resolved image via fallback key"
                    );
                }
                return Ok(object);
            }
        }

        Err(GalleryError::BlobNotFound {
            key: key.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // Metadata Helpers
    // -------------------------------------------------------------------------

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, GalleryError> {
        match self.metadata.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| GalleryError::CorruptRecord {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), GalleryError> {
        let raw = serde_json::to_string(value).map_err(|e| GalleryError::CorruptRecord {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.metadata.put(key, raw).await?;
        Ok(())
    }

    /// Read-modify-write an id list under the key's lock. An emptied list is
    /// deleted rather than stored.
    async fn update_list<F>(&self, key: &str, apply: F) -> Result<(), GalleryError>
    where
        F: FnOnce(&mut Vec<String>),
    {
        let _guard = self.locks.lock(key).await;

        let mut ids: Vec<String> = self.read_json(key).await?.unwrap_or_default();
        apply(&mut ids);

        if ids.is_empty() {
            self.metadata.delete(key).await?;
        } else {
            self.write_json(key, &ids).await?;
        }
        Ok(())
    }
}
