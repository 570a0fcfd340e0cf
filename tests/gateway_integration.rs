//! Gateway Integration Tests
//!
//! Exercises the HTTP routes with stub image models and hand-built
//! multipart bodies.

#![cfg(feature = "server")]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use product_studio::ai::{AIError, ImageEnhancer, ImageInput, ProductAnalyzer};
use product_studio::core::{AnalysisOutcome, DetailValue, Details, FileStatus, ServerConfig};
use product_studio::gateway::{routes, DetailsLog, EnhancementPipeline, UploadStorage};
use product_studio::workflow::UploadSelection;
use product_studio::GatewayClient;
use serde_json::Value;
use tempfile::TempDir;
use warp::http::StatusCode;

const BOUNDARY: &str = "studio-test-boundary";

// ============================================================================
// Stub models
// ============================================================================

/// Prefixes the input bytes, failing for file names containing "bad".
struct StubEnhancer;

#[async_trait]
impl ImageEnhancer for StubEnhancer {
    async fn enhance(&self, image: &ImageInput<'_>, _prompt: &str) -> Result<Vec<u8>, AIError> {
        if image.file_name.contains("bad") {
            return Err(AIError::ApiError { status: 500, body: "model unavailable".into() });
        }
        Ok([b"enhanced:".as_slice(), image.bytes].concat())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

struct StubAnalyzer;

#[async_trait]
impl ProductAnalyzer for StubAnalyzer {
    async fn analyze(&self, _image: &ImageInput<'_>) -> Result<AnalysisOutcome, AIError> {
        let mut details = Details::new();
        details.insert("title".into(), DetailValue::Text("Oak Chair".into()));
        details.insert(
            "recommendations".into(),
            DetailValue::List(vec!["Dining room".into(), "Study".into()]),
        );
        Ok(AnalysisOutcome::Details(details))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn pipeline(dir: &TempDir) -> EnhancementPipeline {
    EnhancementPipeline::new(
        Arc::new(StubEnhancer),
        Arc::new(StubAnalyzer),
        UploadStorage::new(dir.path().join("uploads/original"), dir.path().join("uploads/ai")),
        DetailsLog::new(&dir.path().join("data")),
    )
}

/// Build a multipart body with one `images` part per name and a category.
fn multipart(names: &[&str], category: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    for name in names {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("bytes of {name}").as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some(category) = category {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{category}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> warp::test::RequestBuilder {
    warp::test::request()
        .method("POST")
        .path("/api/upload-images")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_four_images_in_order() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let names = ["front.png", "side.png", "back.png", "detail.png"];
    let response = upload_request(multipart(&names, Some("furniture"))).reply(&filter).await;

    assert_eq!(response.status(), StatusCode::OK);
    let manifest = json_body(response.body());
    assert_eq!(manifest["message"], "Images uploaded and processed successfully");

    let files = manifest["files"].as_array().unwrap();
    assert_eq!(files.len(), 4);
    for (file, name) in files.iter().zip(names) {
        let original = file["original"].as_str().unwrap();
        assert!(original.ends_with(&format!("-{name}")));
        assert_eq!(file["enhanced"], original.replace(".png", "-ai.png"));
        assert_eq!(file["category"], "furniture");

        let stored = std::fs::read(dir.path().join("uploads/ai").join(file["enhanced"].as_str().unwrap()))
            .unwrap();
        assert_eq!(stored, format!("enhanced:bytes of {name}").into_bytes());
    }

    assert_eq!(manifest["details"]["title"], "Oak Chair");
    assert_eq!(manifest["details"]["recommendations"][1], "Study");
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = upload_request(multipart(&[], Some("grocery"))).reply(&filter).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.body())["message"], "No files uploaded");
}

#[tokio::test]
async fn test_upload_with_five_files_is_rejected() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response =
        upload_request(multipart(&["a.png", "b.png", "c.png", "d.png", "e.png"], None)).reply(&filter).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.body())["message"], "Too many files");
}

#[tokio::test]
async fn test_failed_enhancement_is_reported_per_file() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response =
        upload_request(multipart(&["a.png", "bad.png", "c.png", "d.png"], None)).reply(&filter).await;

    assert_eq!(response.status(), StatusCode::OK);
    let manifest = json_body(response.body());
    assert_eq!(manifest["files"][0]["status"], "succeeded");
    assert_eq!(manifest["files"][1]["status"], "failed");
    assert!(manifest["files"][1]["error"].as_str().unwrap().contains("500"));
    assert!(manifest["message"].as_str().unwrap().contains("1 of 4"));
}

#[tokio::test]
async fn test_strict_mode_returns_server_error() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir).with_partial_results(false), &ServerConfig::default());

    let response =
        upload_request(multipart(&["a.png", "bad.png", "c.png", "d.png"], None)).reply(&filter).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response.body())["message"], "Gemini processing failed");
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = warp::test::request()
        .method("POST")
        .path("/api/upload-images")
        .header("content-type", "application/json")
        .body("{}")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_details_are_logged() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(&dir);
    let log = pipeline.details_log().clone();
    let filter = routes(pipeline, &ServerConfig::default());

    let response = upload_request(multipart(&["a.png"], None)).reply(&filter).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = json_body(response.body())["files"][0]["original"].as_str().unwrap().to_string();

    // The append runs in the background
    let mut entries = Vec::new();
    for _ in 0..50 {
        entries = log.read_entries().await.unwrap();
        if !entries.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["image"], first);
    assert_eq!(entries[0]["title"], "Oak Chair");
    assert!(entries[0]["timestamp"].as_str().unwrap().ends_with('Z'));
}

// ============================================================================
// Static Files & Fallback Tests
// ============================================================================

#[tokio::test]
async fn test_stored_images_are_served() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = upload_request(multipart(&["chair.png"], None)).reply(&filter).await;
    let manifest = json_body(response.body());
    let original = manifest["files"][0]["original"].as_str().unwrap();
    let enhanced = manifest["files"][0]["enhanced"].as_str().unwrap();

    let response =
        warp::test::request().path(&format!("/uploads/original/{original}")).reply(&filter).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"bytes of chair.png");

    let response = warp::test::request().path(&format!("/uploads/ai/{enhanced}")).reply(&filter).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"enhanced:bytes of chair.png");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = warp::test::request().path("/api/missing?x=1").reply(&filter).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");

    let body = json_body(response.body());
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route /api/missing not found");
    assert_eq!(body["availableRoutes"][0], "POST /api/upload-images - Upload images");
}

#[tokio::test]
async fn test_cross_origin_request_without_configured_origins() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = upload_request(multipart(&["a.png"], None))
        .header("origin", "http://localhost:5173")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_configured_origin_gets_cors_headers() {
    let dir = TempDir::new().unwrap();
    let server = ServerConfig {
        cors_origins: vec!["http://localhost:5173".to_string()],
        ..ServerConfig::default()
    };
    let filter = routes(pipeline(&dir), &server);

    let response = warp::test::request()
        .path("/api/missing")
        .header("origin", "http://localhost:5173")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["access-control-allow-origin"], "http://localhost:5173");
}

#[tokio::test]
async fn test_get_on_upload_route_is_not_found() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = warp::test::request().path("/api/upload-images").reply(&filter).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response.body())["message"], "Route /api/upload-images not found");
}

#[tokio::test]
async fn test_missing_stored_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());

    let response = warp::test::request().path("/uploads/ai/nothing.png").reply(&filter).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Client Round Trip
// ============================================================================

#[tokio::test]
async fn test_client_uploads_to_running_gateway() {
    let dir = TempDir::new().unwrap();
    let filter = routes(pipeline(&dir), &ServerConfig::default());
    let (addr, server) = warp::serve(filter).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    let photos = TempDir::new().unwrap();
    let paths: Vec<_> = ["a.png", "b.jpg", "c.webp", "d.png"]
        .iter()
        .map(|name| {
            let path = photos.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            path
        })
        .collect();
    let selection = UploadSelection::new(&paths, "home_decor").unwrap();

    let client = GatewayClient::new(format!("http://{addr}"));
    let manifest = client.upload(&selection).await.unwrap();

    assert_eq!(manifest.files.len(), 4);
    assert!(manifest.files.iter().all(|f| f.status == FileStatus::Succeeded));
    assert!(manifest.files.iter().all(|f| f.category == "home_decor"));
    assert!(manifest.files[1].original.ends_with("-b.jpg"));
    assert_eq!(manifest.details.details().unwrap()["title"], DetailValue::Text("Oak Chair".into()));
}
