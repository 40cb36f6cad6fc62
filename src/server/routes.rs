//! Router configuration for the gallery server.
//!
//! This module defines the HTTP routes and applies middleware for CORS,
//! admin authentication, and JSON error shaping.
//!
//! # Route Structure
//!
//! ```text
//! OPTIONS *                         - CORS preflight (always answered)
//! /health                  GET      - Health check
//! /upload                  POST     - Upload images (admin)
//! /gallery                 GET      - List images
//! /groups                  GET      - List groups
//! /delete/{image_id}       DELETE   - Delete image (admin)
//! /delete-group/{group}    DELETE   - Delete group (admin)
//! /image/{*key}            GET      - Image bytes
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gallery_server::gallery::GalleryService;
//! use gallery_server::server::{create_router, RouterConfig};
//! use gallery_server::store::{MemoryBlobStore, MemoryMetadataStore};
//!
//! let gallery = GalleryService::new(
//!     Arc::new(MemoryBlobStore::new()),
//!     Arc::new(MemoryMetadataStore::new()),
//! );
//! let router = create_router(gallery, RouterConfig::new().with_admin_token("secret"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8787").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    handler::HandlerWithoutStateExt,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::auth::{admin_auth_middleware, AdminAuth};
use super::handlers::{
    delete_group_handler, delete_image_handler, gallery_handler, groups_handler, health_handler,
    image_handler, not_found_handler, upload_handler, AppState, ErrorResponse,
};
use crate::gallery::GalleryService;

/// Default Cache-Control max-age for served images (1 day).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 86_400;

/// Default upload body limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const PREFLIGHT_ALLOW_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const PREFLIGHT_ALLOW_HEADERS: &str = "Content-Type, Authorization";
const PREFLIGHT_MAX_AGE: &str = "86400";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Bearer token required on mutating routes (None = open)
    pub admin_token: Option<String>,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds for served images
    pub cache_max_age: u32,

    /// Request body limit for uploads, in bytes
    pub max_upload_bytes: usize,

    /// Directory of static site files served for unmatched GET paths
    pub static_dir: Option<PathBuf>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - Mutating routes are open (no admin token)
    /// - CORS allows any origin
    /// - Cache max-age is 1 day
    /// - Uploads are limited to 50 MiB
    /// - No static directory
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            admin_token: None,
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: None,
            enable_tracing: true,
        }
    }

    /// Require `Authorization: Bearer <token>` on mutating routes.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Set the upload body limit in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Serve static files from a directory.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The gallery service carries the injected blob and metadata stores; the
/// router performs no store discovery of its own.
pub fn create_router(gallery: GalleryService, config: RouterConfig) -> Router {
    let app_state = AppState::new(gallery, config.cache_max_age);

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/gallery", get(gallery_handler))
        .route("/groups", get(groups_handler))
        .route("/image/{*key}", get(image_handler));

    let mut admin_routes = Router::new()
        .route("/upload", post(upload_handler))
        .route("/delete/{image_id}", delete(delete_image_handler))
        .route("/delete-group/{group}", delete(delete_group_handler));

    if let Some(ref token) = config.admin_token {
        admin_routes = admin_routes.route_layer(middleware::from_fn_with_state(
            AdminAuth::new(token),
            admin_auth_middleware,
        ));
    }

    let router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(app_state);

    let router = match config.static_dir {
        Some(ref dir) => router.fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(not_found_handler.into_service()),
        ),
        None => router.fallback(not_found_handler),
    };

    let router = router
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(middleware::from_fn(method_not_allowed_middleware))
        .layer(build_cors_layer(&config))
        .layer(middleware::from_fn(preflight_middleware));

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Answer every OPTIONS request with permissive CORS headers before any
/// routing, authentication or body handling.
pub async fn preflight_middleware(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, PREFLIGHT_ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, PREFLIGHT_ALLOW_HEADERS),
            (header::ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE),
        ],
    )
        .into_response()
}

/// Replace the router's bare 405 with a JSON error, keeping or supplying the
/// `Allow` header.
pub async fn method_not_allowed_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response
        .headers()
        .get(header::ALLOW)
        .cloned()
        .or_else(|| allowed_methods(&path).map(HeaderValue::from_static));

    let mut json = ErrorResponse::into_response_with(
        format!("Method {} not allowed for {}", method, path),
        StatusCode::METHOD_NOT_ALLOWED,
    );
    if let Some(allow) = allow {
        json.headers_mut().insert(header::ALLOW, allow);
    }
    json
}

/// Methods served on a known path, as an `Allow` header value.
pub fn allowed_methods(path: &str) -> Option<&'static str> {
    match path {
        "/health" | "/gallery" | "/groups" => Some("GET,HEAD"),
        "/upload" => Some("POST"),
        p if p.starts_with("/delete/") && p.len() > "/delete/".len() => Some("DELETE"),
        p if p.starts_with("/delete-group/") && p.len() > "/delete-group/".len() => {
            Some("DELETE")
        }
        p if p.starts_with("/image/") && p.len() > "/image/".len() => Some("GET,HEAD"),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
