//! Gallery domain layer.
//!
//! Sits between the HTTP handlers and the storage adapters:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             GalleryService              │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   KeyLocks   │  │     naming      │  │
//! │  │ (per-list    │  │ (ids, keys,     │  │
//! │  │  writers)    │  │  fallbacks)     │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │       BlobStore + MetadataStore         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Metadata Layout
//!
//! | Key               | Value                         |
//! |-------------------|-------------------------------|
//! | `image:{id}`      | [`ImageRecord`] as JSON       |
//! | `group:{label}`   | JSON array of image ids       |
//! | `gallery:index`   | JSON array of all image ids   |
//!
//! Image bytes live in the blob store under `images/{id}.{ext}`.

mod locks;
mod naming;
mod record;
mod service;

pub use locks::KeyLocks;
pub use naming::{
    candidate_keys, content_type_for_key, derive_extension, generate_id, resolve_content_type,
    storage_key, KeyStrategy, DEFAULT_EXTENSION, FALLBACK_CONTENT_TYPE, KEY_STRATEGIES,
};
pub use record::{
    group_key, image_key, image_url, normalize_group, ImageRecord, DEFAULT_GROUP,
    GROUP_KEY_PREFIX, IMAGE_KEY_PREFIX, IMAGE_ROUTE_PREFIX, INDEX_KEY, STORAGE_PREFIX,
};
pub use service::{GalleryService, UploadFile, UploadPayload, IMMUTABLE_CACHE_CONTROL};
