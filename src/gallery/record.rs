//! Image records and the metadata key layout.
//!
//! | Key               | Value                        |
//! |-------------------|------------------------------|
//! | `image:{id}`      | [`ImageRecord`] as JSON      |
//! | `group:{label}`   | JSON array of image ids      |
//! | `gallery:index`   | JSON array of every image id |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group label used when an upload names no group.
pub const DEFAULT_GROUP: &str = "default";

/// Metadata key prefix for image records.
pub const IMAGE_KEY_PREFIX: &str = "image:";

/// Metadata key prefix for group id lists.
pub const GROUP_KEY_PREFIX: &str = "group:";

/// Metadata key of the global gallery index.
pub const INDEX_KEY: &str = "gallery:index";

/// Blob key prefix for image bytes.
pub const STORAGE_PREFIX: &str = "images/";

/// Route prefix images are served from.
pub const IMAGE_ROUTE_PREFIX: &str = "/image/";

/// Metadata record for one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub storage_key: String,
    pub url: String,
    pub group: String,
    pub uploaded_at: DateTime<Utc>,
    pub size: u64,
    pub content_type: String,
}

impl ImageRecord {
    pub fn new(
        id: impl Into<String>,
        storage_key: impl Into<String>,
        group: impl Into<String>,
        uploaded_at: DateTime<Utc>,
        size: u64,
        content_type: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        Self {
            id: id.into(),
            url: image_url(&storage_key),
            storage_key,
            group: group.into(),
            uploaded_at,
            size,
            content_type: content_type.into(),
        }
    }

    /// Metadata key this record is stored under.
    pub fn key(&self) -> String {
        image_key(&self.id)
    }
}

pub fn image_key(id: &str) -> String {
    format!("{}{}", IMAGE_KEY_PREFIX, id)
}

pub fn group_key(group: &str) -> String {
    format!("{}{}", GROUP_KEY_PREFIX, group)
}

/// Public URL for a storage key. Each path segment is percent-encoded.
pub fn image_url(storage_key: &str) -> String {
    let encoded: Vec<_> = storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment))
        .collect();
    format!("{}{}", IMAGE_ROUTE_PREFIX, encoded.join("/"))
}

/// Normalize a user-supplied group label, falling back to [`DEFAULT_GROUP`].
pub fn normalize_group(group: Option<&str>) -> String {
    match group.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => DEFAULT_GROUP.to_string(),
    }
}
