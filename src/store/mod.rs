//! Storage adapters for the gallery.
//!
//! The gallery talks to two external collaborators:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             GalleryService              │
//! └───────────┬─────────────────┬───────────┘
//!             │                 │
//!             ▼                 ▼
//! ┌───────────────────┐ ┌───────────────────┐
//! │   BlobStore       │ │  MetadataStore    │
//! │ (image bytes)     │ │ (JSON records)    │
//! └───────────────────┘ └───────────────────┘
//!     │         │           │         │
//!     ▼         ▼           ▼         ▼
//!   S3Blob   MemoryBlob   S3Meta   MemoryMeta
//! ```
//!
//! Both traits are object safe so the router can be built from
//! `Arc<dyn BlobStore>` / `Arc<dyn MetadataStore>` chosen at startup.

mod blob;
mod memory;
mod metadata;
mod s3;

pub use blob::{BlobMetadata, BlobObject, BlobStore, PutOptions};
pub use memory::{MemoryBlobStore, MemoryMetadataStore};
pub use metadata::MetadataStore;
pub use s3::{create_s3_client, S3BlobStore, S3MetadataStore};
