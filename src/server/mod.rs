//! HTTP server layer for the gallery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      POST /upload · GET /gallery · DELETE /delete/{id} ...      │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │(admin token)│  │ (router, CORS, 404/405) │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{admin_auth_middleware, AdminAuth, AuthError};
pub use handlers::{
    delete_group_handler, delete_image_handler, gallery_handler, groups_handler, health_handler,
    image_handler, not_found_handler, upload_handler, AppState, DeleteResponse, ErrorResponse,
    GalleryResponse, HealthResponse, UploadResponse, GROUP_FIELD, IMAGES_FIELD,
};
pub use routes::{
    allowed_methods, create_router, method_not_allowed_middleware, preflight_middleware,
    RouterConfig, DEFAULT_CACHE_MAX_AGE, DEFAULT_MAX_UPLOAD_BYTES,
};
