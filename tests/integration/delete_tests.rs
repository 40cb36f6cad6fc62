//! Image and group deletion tests.

use axum::http::StatusCode;

use gallery_server::MetadataStore;

use super::test_utils::{assert_json_error, json_body, MultipartForm, TestApp, PNG_BYTES};

async fn index_ids(app: &TestApp) -> Vec<String> {
    match app.metadata.get("gallery:index").await.unwrap() {
        Some(raw) => serde_json::from_str(&raw).unwrap(),
        None => Vec::new(),
    }
}

#[tokio::test]
async fn test_delete_image() {
    let app = TestApp::new();

    let images = app
        .upload_ok(
            MultipartForm::new()
                .group("pets")
                .image("cat.png", "image/png", PNG_BYTES)
                .image("dog.png", "image/png", PNG_BYTES),
        )
        .await;
    let cat = images[0]["id"].as_str().unwrap();
    let dog = images[1]["id"].as_str().unwrap();
    let cat_key = images[0]["storageKey"].as_str().unwrap();

    let response = app.delete(&format!("/delete/{cat}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], true);

    assert!(!app.blobs.contains(cat_key).await);
    assert!(app.metadata.get(&format!("image:{cat}")).await.unwrap().is_none());
    assert_eq!(index_ids(&app).await, vec![dog.to_string()]);

    let listed = app.gallery().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], dog);

    // The group survives while it still has members
    assert_eq!(app.groups().await, vec!["pets".to_string()]);

    // Serving the removed image now misses
    let response = app.get(&format!("/image/{cat_key}")).await;
    assert_json_error(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn test_delete_last_image_removes_group() {
    let app = TestApp::new();

    let images = app
        .upload_ok(
            MultipartForm::new()
                .group("solo")
                .image("only.png", "image/png", PNG_BYTES),
        )
        .await;
    let id = images[0]["id"].as_str().unwrap();

    let response = app.delete(&format!("/delete/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.groups().await.is_empty());
    assert!(app.metadata.get("group:solo").await.unwrap().is_none());
    assert!(app.blobs.is_empty().await);
}

#[tokio::test]
async fn test_delete_unknown_image() {
    let app = TestApp::new();

    let response = app.delete("/delete/does-not-exist").await;
    let message = assert_json_error(response, StatusCode::NOT_FOUND).await;
    assert!(message.contains("does-not-exist"));
}

#[tokio::test]
async fn test_delete_image_twice() {
    let app = TestApp::new();

    let images = app
        .upload_ok(MultipartForm::new().image("a.png", "image/png", PNG_BYTES))
        .await;
    let id = images[0]["id"].as_str().unwrap();

    assert_eq!(
        app.delete(&format!("/delete/{id}")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        app.delete(&format!("/delete/{id}")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_delete_group() {
    let app = TestApp::new();

    app.upload_ok(
        MultipartForm::new()
            .group("summer trips")
            .image("a.png", "image/png", PNG_BYTES)
            .image("b.png", "image/png", PNG_BYTES)
            .image("c.png", "image/png", PNG_BYTES),
    )
    .await;
    let kept = app
        .upload_ok(
            MultipartForm::new()
                .group("winter")
                .image("d.png", "image/png", PNG_BYTES),
        )
        .await;
    let kept_id = kept[0]["id"].as_str().unwrap();

    let response = app.delete("/delete-group/summer%20trips").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["deleted"], 3);

    assert_eq!(app.groups().await, vec!["winter".to_string()]);
    assert_eq!(index_ids(&app).await, vec![kept_id.to_string()]);
    assert_eq!(app.blobs.len().await, 1);

    let listed = app.gallery().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["group"], "winter");
}

#[tokio::test]
async fn test_delete_unknown_group() {
    let app = TestApp::new();

    let response = app.delete("/delete-group/nobody").await;
    let message = assert_json_error(response, StatusCode::NOT_FOUND).await;
    assert!(message.contains("nobody"));
}

#[tokio::test]
async fn test_delete_group_tolerates_missing_records() {
    let app = TestApp::new();

    let images = app
        .upload_ok(
            MultipartForm::new()
                .group("drift")
                .image("a.png", "image/png", PNG_BYTES),
        )
        .await;
    let id = images[0]["id"].as_str().unwrap();

    // The group list also names an id whose record is gone
    let members = serde_json::to_string(&vec![id.to_string(), "ghost".to_string()]).unwrap();
    app.metadata.put("group:drift", members).await.unwrap();

    let response = app.delete("/delete-group/drift").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["deleted"], 1);

    assert!(app.groups().await.is_empty());
    assert!(index_ids(&app).await.is_empty());
}
