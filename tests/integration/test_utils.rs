//! Test utilities for integration tests.
//!
//! Builds routers over in-memory stores that the test keeps handles to, and
//! encodes multipart upload bodies.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use gallery_server::{
    create_router, GalleryService, MemoryBlobStore, MemoryMetadataStore, RouterConfig,
};

pub const BOUNDARY: &str = "gallery-test-boundary-7MA4YWxk";

/// Minimal PNG signature plus padding; content is never decoded.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n0000000000000000";

// =============================================================================
// Test Application
// =============================================================================

/// A router plus handles to the stores behind it.
pub struct TestApp {
    pub router: Router,
    pub blobs: Arc<MemoryBlobStore>,
    pub metadata: Arc<MemoryMetadataStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::new().with_tracing(false))
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let metadata = Arc::new(MemoryMetadataStore::new());
        let gallery = GalleryService::new(blobs.clone(), metadata.clone());

        Self {
            router: create_router(gallery, config),
            blobs,
            metadata,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, form: MultipartForm) -> Response<Body> {
        self.send(form.into_request("/upload")).await
    }

    /// Upload files and return the created records, asserting success.
    pub async fn upload_ok(&self, form: MultipartForm) -> Vec<Value> {
        let response = self.upload(form).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        body["images"].as_array().cloned().unwrap()
    }

    /// Current `/gallery` listing.
    pub async fn gallery(&self) -> Vec<Value> {
        let response = self.get("/gallery").await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["images"]
            .as_array()
            .cloned()
            .unwrap()
    }

    /// Current `/groups` listing.
    pub async fn groups(&self) -> Vec<String> {
        let response = self.get("/groups").await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_value(json_body(response).await).unwrap()
    }
}

// =============================================================================
// Multipart Bodies
// =============================================================================

/// Builder for `multipart/form-data` upload bodies.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
    bearer: Option<String>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(self, label: &str) -> Self {
        self.text("group", label)
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn image(self, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.file("images", file_name, content_type, data)
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

pub async fn body_bytes(response: Response<Body>) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the standard JSON error shape and return the message.
pub async fn assert_json_error(response: Response<Body>, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    let body = json_body(response).await;
    assert_eq!(body["status"], status.as_u16());
    body["error"].as_str().unwrap().to_string()
}
