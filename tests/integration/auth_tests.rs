//! Admin token tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

use gallery_server::RouterConfig;

use super::test_utils::{assert_json_error, json_body, MultipartForm, TestApp, PNG_BYTES};

const TOKEN: &str = "test-admin-token";

fn protected_app() -> TestApp {
    TestApp::with_config(
        RouterConfig::new()
            .with_tracing(false)
            .with_admin_token(TOKEN),
    )
}

fn delete_request(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = protected_app();

    let response = app
        .upload(MultipartForm::new().image("a.png", "image/png", PNG_BYTES))
        .await;
    let message = assert_json_error(response, StatusCode::UNAUTHORIZED).await;
    assert!(message.contains("Missing"));
    assert!(app.blobs.is_empty().await);

    let response = app
        .upload(
            MultipartForm::new()
                .bearer("wrong")
                .image("a.png", "image/png", PNG_BYTES),
        )
        .await;
    assert_json_error(response, StatusCode::UNAUTHORIZED).await;
    assert!(app.blobs.is_empty().await);
}

#[tokio::test]
async fn test_upload_with_token() {
    let app = protected_app();

    let images = app
        .upload_ok(
            MultipartForm::new()
                .bearer(TOKEN)
                .image("a.png", "image/png", PNG_BYTES),
        )
        .await;
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn test_reads_are_public() {
    let app = protected_app();

    let images = app
        .upload_ok(
            MultipartForm::new()
                .bearer(TOKEN)
                .image("a.png", "image/png", PNG_BYTES),
        )
        .await;

    assert_eq!(app.gallery().await.len(), 1);
    assert_eq!(app.groups().await, vec!["default".to_string()]);
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);

    let response = app.get(images[0]["url"].as_str().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deletes_require_token() {
    let app = protected_app();

    let images = app
        .upload_ok(
            MultipartForm::new()
                .bearer(TOKEN)
                .group("locked")
                .image("a.png", "image/png", PNG_BYTES),
        )
        .await;
    let id = images[0]["id"].as_str().unwrap();
    let uri = format!("/delete/{id}");

    let response = app.send(delete_request(&uri, None)).await;
    assert_json_error(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .send(delete_request(&uri, Some(&format!("Basic {TOKEN}"))))
        .await;
    let message = assert_json_error(response, StatusCode::UNAUTHORIZED).await;
    assert!(message.contains("Bearer"));

    let response = app
        .send(delete_request("/delete-group/locked", Some("Bearer nope")))
        .await;
    assert_json_error(response, StatusCode::UNAUTHORIZED).await;

    // Nothing was removed
    assert_eq!(app.gallery().await.len(), 1);

    let response = app
        .send(delete_request(
            "/delete-group/locked",
            Some(&format!("Bearer {TOKEN}")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], 1);
    assert!(app.gallery().await.is_empty());
}

#[tokio::test]
async fn test_open_server_needs_no_token() {
    let app = TestApp::new();

    let images = app
        .upload_ok(MultipartForm::new().image("a.png", "image/png", PNG_BYTES))
        .await;
    let id = images[0]["id"].as_str().unwrap();

    let response = app.delete(&format!("/delete/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
