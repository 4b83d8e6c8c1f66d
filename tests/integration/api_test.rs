//! HTTP API tests
//!
//! Drive the full router over the in-memory backend, where restores
//! complete immediately.

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use coldvault::backend::create_app;
use coldvault::backend::server::ServerConfig;
use coldvault::shared::VaultConfig;

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

async fn server() -> TestServer {
    let config = ServerConfig {
        public_base_url: "http://127.0.0.1:3000".to_string(),
        signing_secret: "test-secret".to_string(),
        ..Default::default()
    };
    let app = create_app(config, VaultConfig::default()).await;
    TestServer::new(app).unwrap()
}

fn photo_form(owner: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("ownerId", owner)
        .add_text("title", "Beach")
        .add_text("tags", "summer, family")
        .add_part(
            "file",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name("beach.png")
                .mime_type("image/png"),
        )
}

async fn upload(server: &TestServer, owner: &str) -> String {
    let response = server.post("/items").multipart(photo_form(owner)).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["item"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let server = server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_upload_returns_archived_item() {
    let server = server().await;
    let response = server.post("/items").multipart(photo_form("u1")).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let item = &body["item"];
    assert_eq!(item["status"], "archived");
    assert_eq!(item["ownerId"], "u1");
    assert_eq!(item["title"], "Beach");
    assert_eq!(item["sizeBytes"], PNG_BYTES.len());
    assert_eq!(item["tags"], json!(["family", "summer"]));
    assert!(item.get("restoreExpiresAt").is_none());
}

#[tokio::test]
async fn test_upload_accepts_legacy_field_names() {
    let server = server().await;
    let form = MultipartForm::new()
        .add_text("userId", "u9")
        .add_text("tags", r#"["a","b"]"#)
        .add_part(
            "photo",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name("a.png")
                .mime_type("image/png"),
        );

    let response = server.post("/items").multipart(form).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["item"]["ownerId"], "u9");
    assert_eq!(body["item"]["tags"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let server = server().await;
    let form = MultipartForm::new().add_text("ownerId", "u1").add_part(
        "file",
        Part::bytes(b"%PDF-1.7".to_vec())
            .file_name("doc.pdf")
            .mime_type("application/pdf"),
    );

    let response = server.post("/items").multipart(form).await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_upload_requires_owner_and_file() {
    let server = server().await;

    let no_owner = MultipartForm::new().add_part(
        "file",
        Part::bytes(PNG_BYTES.to_vec())
            .file_name("a.png")
            .mime_type("image/png"),
    );
    let response = server.post("/items").multipart(no_owner).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], 400);

    let no_file = MultipartForm::new().add_text("ownerId", "u1");
    server
        .post("/items")
        .multipart(no_file)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let server = server().await;
    let response = server
        .get(&format!("/items/{}", uuid::Uuid::new_v4()))
        .await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_download_before_restore_conflicts() {
    let server = server().await;
    let id = upload(&server, "u1").await;

    server
        .get(&format!("/items/{}/download", id))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_restore_then_download_blob() {
    let server = server().await;
    let id = upload(&server, "u1").await;

    let response = server
        .post(&format!("/items/{}/restore", id))
        .json(&json!({ "tier": "Bulk" }))
        .await;
    response.assert_status_ok();
    let receipt: Value = response.json();
    assert_eq!(receipt["status"], "restore_requested");
    assert_eq!(receipt["tier"], "Bulk");
    assert_eq!(receipt["coalesced"], false);

    let response = server.get(&format!("/items/{}/status", id)).await;
    response.assert_status_ok();
    let status: Value = response.json();
    assert_eq!(status["status"], "restored");
    assert!(status["restoreExpiresAt"].is_string());

    let response = server.get(&format!("/items/{}/download", id)).await;
    response.assert_status_ok();
    let reference: Value = response.json();
    assert_eq!(reference["ttlSecs"], 3600);
    let url = reference["url"].as_str().unwrap();
    let token = url
        .split("/blobs/")
        .nth(1)
        .expect("reference points at the blob route");

    let blob = server.get(&format!("/blobs/{}", token)).await;
    blob.assert_status_ok();
    assert_eq!(blob.header("content-type"), "image/png");
    assert_eq!(&blob.as_bytes()[..], PNG_BYTES);
}

#[tokio::test]
async fn test_restore_without_body_uses_default_tier() {
    let server = server().await;
    let id = upload(&server, "u1").await;

    let response = server.post(&format!("/items/{}/restore", id)).await;
    response.assert_status_ok();
    let receipt: Value = response.json();
    assert_eq!(receipt["tier"], "Standard");
}

#[tokio::test]
async fn test_forged_token_is_forbidden() {
    let server = server().await;
    server
        .get("/blobs/not-a-token")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_patch_updates_metadata() {
    let server = server().await;
    let id = upload(&server, "u1").await;

    let response = server
        .patch(&format!("/items/{}", id))
        .json(&json!({ "description": "Sunset", "tags": ["beach"] }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["item"]["title"], "Beach");
    assert_eq!(body["item"]["description"], "Sunset");
    assert_eq!(body["item"]["tags"], json!(["beach"]));

    server
        .patch(&format!("/items/{}", id))
        .json(&json!({ "tags": ["  "] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_then_gone() {
    let server = server().await;
    let id = upload(&server, "u1").await;

    server
        .delete(&format!("/items/{}", id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/items/{}", id))
        .await
        .assert_status_not_found();
    server
        .delete(&format!("/items/{}", id))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_list_and_stats_by_owner() {
    let server = server().await;
    upload(&server, "u1").await;
    let restored = upload(&server, "u1").await;
    upload(&server, "u2").await;
    server
        .post(&format!("/items/{}/restore", restored))
        .await
        .assert_status_ok();

    let response = server.get("/items").add_query_param("owner", "u1").await;
    response.assert_status_ok();
    let list: Value = response.json();
    assert_eq!(list["count"], 2);

    let response = server
        .get("/items/stats")
        .add_query_param("owner", "u1")
        .await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["totalItems"], 2);
    assert_eq!(stats["totalBytes"], 2 * PNG_BYTES.len());
    assert_eq!(stats["byStatus"]["archived"]["count"], 1);
    assert_eq!(stats["byStatus"]["restore_requested"]["count"], 1);
}

#[tokio::test]
async fn test_missing_owner_is_json_bad_request() {
    let server = server().await;

    for path in ["/items", "/items/stats"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().unwrap().contains("owner"));
    }
}

#[tokio::test]
async fn test_unknown_route() {
    let server = server().await;
    server.get("/nope").await.assert_status_not_found();
}
