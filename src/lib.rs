//! # Gallery Server
//!
//! An image gallery API storing image bytes in S3-compatible object storage
//! and small JSON records in a key-value store.
//!
//! ## Features
//!
//! - **Grouped uploads**: multipart uploads of many images under one group label
//! - **Gallery listing**: all images newest first, tolerant of index drift
//! - **Group management**: list groups, delete one image or a whole group
//! - **Image serving**: raw bytes with content type, cache headers and ETag,
//!   resolving keys from older storage layouts
//! - **Pluggable stores**: S3 or in-memory, injected at startup
//!
//! ## Architecture
//!
//! - [`store`] - Blob and metadata store traits with S3 and memory backends
//! - [`gallery`] - Gallery service, records, key naming and per-key locks
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gallery_server::{create_router, GalleryService, MemoryBlobStore, MemoryMetadataStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gallery = GalleryService::new(
//!         Arc::new(MemoryBlobStore::new()),
//!         Arc::new(MemoryMetadataStore::new()),
//!     );
//!     let router = create_router(gallery, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8787").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod gallery;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{Backend, CheckConfig, Cli, Command, ServeConfig, StoreArgs};
pub use error::{GalleryError, IoError};
pub use gallery::{GalleryService, ImageRecord, UploadFile, UploadPayload, DEFAULT_GROUP};
pub use server::{create_router, AdminAuth, AppState, ErrorResponse, RouterConfig};
pub use store::{
    create_s3_client, BlobMetadata, BlobObject, BlobStore, MemoryBlobStore, MemoryMetadataStore,
    MetadataStore, PutOptions, S3BlobStore, S3MetadataStore,
};
