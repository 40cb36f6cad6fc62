//! Routing tests: health, CORS preflight, JSON 404/405 and static files.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

use gallery_server::RouterConfig;

use super::test_utils::{
    assert_json_error, body_bytes, json_body, MultipartForm, TestApp, PNG_BYTES,
};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

// =============================================================================
// Unknown Paths and Methods
// =============================================================================

#[tokio::test]
async fn test_unknown_path() {
    let app = TestApp::new();

    let response = app.get("/nope").await;
    let message = assert_json_error(response, StatusCode::NOT_FOUND).await;
    assert_eq!(message, "Not found");

    let response = app.delete("/delete").await;
    assert_json_error(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn test_wrong_method_on_upload() {
    let app = TestApp::new();

    let response = app.get("/upload").await;
    let allow = response
        .headers()
        .get(header::ALLOW)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(allow.contains("POST"));
    assert_json_error(response, StatusCode::METHOD_NOT_ALLOWED).await;
}

#[tokio::test]
async fn test_wrong_method_on_read_routes() {
    let app = TestApp::new();

    for uri in ["/gallery", "/groups", "/health", "/image/images/a.png"] {
        let response = app.delete(uri).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        let allow = response.headers().get(header::ALLOW).unwrap();
        assert!(allow.to_str().unwrap().contains("GET"), "{uri}");
    }

    let response = app.get("/delete/some-id").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response
        .headers()
        .get(header::ALLOW)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("DELETE"));
}

#[tokio::test]
async fn test_wrong_method_is_405_even_with_token() {
    let app = TestApp::with_config(
        RouterConfig::new()
            .with_tracing(false)
            .with_admin_token("secret"),
    );

    let response = app.get("/delete-group/anything").await;
    assert_json_error(response, StatusCode::METHOD_NOT_ALLOWED).await;
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_options_answered_everywhere() {
    let app = TestApp::with_config(
        RouterConfig::new()
            .with_tracing(false)
            .with_admin_token("secret"),
    );

    for uri in ["/upload", "/gallery", "/delete/abc", "/not-a-route"] {
        let response = app
            .send(
                Request::builder()
                    .method("OPTIONS")
                    .uri(uri)
                    .header(header::ORIGIN, "https://site.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{uri}");
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        let methods = headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        for method in ["GET", "POST", "DELETE", "OPTIONS"] {
            assert!(methods.contains(method));
        }
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    }
}

#[tokio::test]
async fn test_bare_options_without_origin() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/gallery")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_cors_headers_on_responses() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .uri("/gallery")
                .header(header::ORIGIN, "https://site.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );

    // Errors carry CORS headers too
    let response = app
        .send(
            Request::builder()
                .uri("/missing")
                .header(header::ORIGIN, "https://site.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_restricted_cors_origins() {
    let app = TestApp::with_config(
        RouterConfig::new()
            .with_tracing(false)
            .with_cors_origins(vec!["https://allowed.example".to_string()]),
    );

    let response = app
        .send(
            Request::builder()
                .uri("/gallery")
                .header(header::ORIGIN, "https://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://allowed.example"
    );

    let response = app
        .send(
            Request::builder()
                .uri("/gallery")
                .header(header::ORIGIN, "https://other.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

// =============================================================================
// Limits
// =============================================================================

#[tokio::test]
async fn test_upload_body_limit() {
    let app = TestApp::with_config(
        RouterConfig::new()
            .with_tracing(false)
            .with_max_upload_bytes(256),
    );

    let response = app
        .upload(MultipartForm::new().image("big.png", "image/png", &[7u8; 4096]))
        .await;
    assert!(response.status().is_client_error());
    assert!(app.blobs.is_empty().await);
    assert!(app.metadata.is_empty().await);

    // Small uploads still fit
    let images = app
        .upload_ok(MultipartForm::new().image("small.png", "image/png", PNG_BYTES))
        .await;
    assert_eq!(images.len(), 1);
}

// =============================================================================
// Static Files
// =============================================================================

#[tokio::test]
async fn test_static_dir_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Gallery</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();

    let app = TestApp::with_config(
        RouterConfig::new()
            .with_tracing(false)
            .with_static_dir(dir.path()),
    );

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"<h1>Gallery</h1>");

    let response = app.get("/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);

    // API routes still win over static files
    let response = app.get("/gallery").await;
    assert_eq!(json_body(response).await["images"], serde_json::json!([]));

    // Unknown files and non-GET requests fall through to the JSON 404
    let response = app.get("/missing.css").await;
    assert_json_error(response, StatusCode::NOT_FOUND).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/app.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_json_error(response, StatusCode::NOT_FOUND).await;
}
