//! HTTP request handlers for the gallery API.
//!
//! # Endpoints
//!
//! - `POST /upload` - Upload images into a group
//! - `GET /gallery` - List all images, newest first
//! - `GET /groups` - List group labels
//! - `DELETE /delete/{image_id}` - Delete one image
//! - `DELETE /delete-group/{group}` - Delete every image in a group
//! - `GET /image/{key}` - Serve image bytes
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{GalleryError, IoError};
use crate::gallery::{
    content_type_for_key, GalleryService, ImageRecord, UploadFile, UploadPayload,
};

/// Form field carrying the group label.
pub const GROUP_FIELD: &str = "group";

/// Form field carrying image files (repeated).
pub const IMAGES_FIELD: &str = "images";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the gallery service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Gallery operations over the injected stores
    pub gallery: Arc<GalleryService>,

    /// Cache-Control max-age in seconds for served images
    pub cache_max_age: u32,
}

impl AppState {
    pub fn new(gallery: GalleryService, cache_max_age: u32) -> Self {
        Self {
            gallery: Arc::new(gallery),
            cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// HTTP status code, mirrored from the response line
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            status: status.as_u16(),
        }
    }

    /// Build a full JSON error response.
    pub fn into_response_with(error: impl Into<String>, status: StatusCode) -> Response {
        (status, Json(Self::new(error, status))).into_response()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response from the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub images: Vec<ImageRecord>,
}

/// Response from the gallery endpoint.
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub images: Vec<ImageRecord>,
}

/// Response from the delete endpoints.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,

    /// Number of images removed (group deletes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert GalleryError to HTTP response.
///
/// - 5xx errors are logged at ERROR level
/// - 404s are logged at DEBUG level (common and expected)
/// - other 4xx errors are logged at WARN level
impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = match &self {
            GalleryError::InvalidRequest(_) | GalleryError::NoFiles => StatusCode::BAD_REQUEST,
            GalleryError::ImageNotFound { .. }
            | GalleryError::GroupNotFound { .. }
            | GalleryError::BlobNotFound { .. }
            | GalleryError::Io(IoError::NotFound(_)) => StatusCode::NOT_FOUND,
            GalleryError::UploadVerification { .. }
            | GalleryError::CorruptRecord { .. }
            | GalleryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), "Server error: {}", message);
        } else if status == StatusCode::NOT_FOUND {
            debug!(status = status.as_u16(), "Resource not found: {}", message);
        } else {
            warn!(status = status.as_u16(), "Client error: {}", message);
        }

        ErrorResponse::into_response_with(message, status)
    }
}

fn invalid_request(message: impl Into<String>) -> GalleryError {
    GalleryError::InvalidRequest(message.into())
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image uploads.
///
/// # Endpoint
///
/// `POST /upload` with `multipart/form-data`
///
/// # Form Fields
///
/// - `group`: Group label (optional, defaults to `default`)
/// - `images`: One or more image files
///
/// # Response
///
/// - `200 OK`: `{"success": true, "images": [...]}`
/// - `400 Bad Request`: Not a multipart body, or no files
/// - `500 Internal Server Error`: Storage failure or failed upload verification
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, GalleryError> {
    let mut multipart = multipart.map_err(|e| invalid_request(e.body_text()))?;

    let mut group: Option<String> = None;
    let mut payloads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid_request(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(GROUP_FIELD) => {
                group = Some(field.text().await.map_err(|e| invalid_request(e.body_text()))?);
            }
            Some(IMAGES_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);

                let payload = if file_name.is_some() {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| invalid_request(e.body_text()))?;
                    UploadPayload::File(UploadFile {
                        file_name,
                        content_type,
                        data,
                    })
                } else {
                    let value = field.text().await.map_err(|e| invalid_request(e.body_text()))?;
                    UploadPayload::Value(value)
                };
                payloads.push(payload);
            }
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    let images = state.gallery.upload(group.as_deref(), payloads).await?;

    Ok(Json(UploadResponse {
        success: true,
        images,
    }))
}

/// Handle gallery listing.
///
/// # Endpoint
///
/// `GET /gallery`
///
/// # Response
///
/// `200 OK` with `{"images": [...]}` sorted by `uploadedAt`, newest first.
pub async fn gallery_handler(
    State(state): State<AppState>,
) -> Result<Json<GalleryResponse>, GalleryError> {
    let images = state.gallery.list_images().await?;
    Ok(Json(GalleryResponse { images }))
}

/// Handle group listing.
///
/// # Endpoint
///
/// `GET /groups`
///
/// # Response
///
/// `200 OK` with a JSON array of labels in ascending order.
pub async fn groups_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, GalleryError> {
    Ok(Json(state.gallery.list_groups().await?))
}

/// Handle single image deletion.
///
/// # Endpoint
///
/// `DELETE /delete/{image_id}`
///
/// # Response
///
/// - `200 OK`: `{"success": true}`
/// - `404 Not Found`: No record for the id
pub async fn delete_image_handler(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<DeleteResponse>, GalleryError> {
    state.gallery.delete_image(&image_id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        deleted: None,
    }))
}

/// Handle group deletion.
///
/// # Endpoint
///
/// `DELETE /delete-group/{group}` (label URL-encoded)
///
/// # Response
///
/// - `200 OK`: `{"success": true, "deleted": n}`
/// - `404 Not Found`: No list for the group
pub async fn delete_group_handler(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<DeleteResponse>, GalleryError> {
    let deleted = state.gallery.delete_group(&group).await?;
    Ok(Json(DeleteResponse {
        success: true,
        deleted: Some(deleted),
    }))
}

/// Handle image byte requests.
///
/// # Endpoint
///
/// `GET /image/{key}` where key may contain slashes
///
/// # Response
///
/// - `200 OK`: Raw bytes
/// - `304 Not Modified`: `If-None-Match` matches the stored entity tag
/// - `404 Not Found`: No candidate key resolved
///
/// # Headers
///
/// - `Content-Type`: stored type, else inferred from the extension
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `ETag` when the store provides one
pub async fn image_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    request_headers: HeaderMap,
) -> Result<Response, GalleryError> {
    let object = state.gallery.fetch_image(&key).await?;
    let metadata = object.metadata;

    let mut headers = HeaderMap::new();
    let content_type = metadata
        .content_type
        .clone()
        .unwrap_or_else(|| content_type_for_key(&metadata.key));
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", state.cache_max_age)) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    if let Some(etag) = metadata.etag.as_deref() {
        if let Ok(value) = HeaderValue::from_str(etag) {
            headers.insert(header::ETAG, value);
        }

        let matches = request_headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| if_none_match_matches(v, etag));
        if matches {
            return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
        }
    }

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(object.data.len()));

    Ok((StatusCode::OK, headers, Body::from(object.data)).into_response())
}

/// Weak comparison of an `If-None-Match` list against an entity tag.
/// `*` matches any current representation.
fn if_none_match_matches(header_value: &str, etag: &str) -> bool {
    fn opaque(tag: &str) -> &str {
        let tag = tag.trim();
        tag.strip_prefix("W/").unwrap_or(tag)
    }

    let etag = opaque(etag);
    header_value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque(candidate) == etag)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// JSON 404 for paths no route matches.
pub async fn not_found_handler() -> Response {
    ErrorResponse::into_response_with("Not found", StatusCode::NOT_FOUND)
}

// =============================================================================
// Tests
// =============================================================================
