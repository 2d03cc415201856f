//! End-to-end tests driving the HTTP router: multipart upload through the
//! compression pipelines to archives on disk, then download.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use image::{Rgba, RgbaImage};
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

use pixelpress::server::{router, AppState};
use pixelpress::service::CompressionService;

const BOUNDARY: &str = "pixelpress-test-boundary";

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            ((x * 255) / width) as u8,
            ((y * 255) / height) as u8,
            96,
            255,
        ])
    });
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Build a multipart/form-data body with one part per (field, filename, bytes).
fn multipart_body(parts: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
    (content_type, body)
}

fn test_state(output_dir: &Path) -> AppState {
    AppState::new(
        Arc::new(CompressionService::new(output_dir)),
        output_dir.to_path_buf(),
        CancellationToken::new(),
    )
}

async fn post_upload(app: axum::Router, parts: &[(&str, &str, &[u8])]) -> (StatusCode, serde_json::Value) {
    let (content_type, body) = multipart_body(parts);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_upload_produces_tiered_archive() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(dir.path()));

    let image = png_bytes(100, 100);
    let (status, json) = post_upload(app, &[("images", "test.png", &image)]).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["errors"].as_array().unwrap().len(), 0);

    let success = json["success"].as_array().unwrap();
    assert_eq!(success.len(), 1);

    let archive_name = success[0].as_str().unwrap();
    assert!(archive_name.starts_with("test_"));
    assert!(archive_name.ends_with(".zip"));
    let identifier = &archive_name["test_".len()..archive_name.len() - ".zip".len()];
    assert_eq!(identifier.len(), 8);
    assert!(identifier.chars().all(|c| c.is_ascii_hexdigit()));

    // The archive holds exactly one variant per default tier, each no larger
    // than the source scaled by quality/110.
    let file = std::fs::File::open(dir.path().join(archive_name)).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 3);
    for quality in [50u32, 70, 90] {
        let mut entry = archive
            .by_name(&format!("test_{}.jpg", quality))
            .unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        let max_dim = (100.0 * quality as f64 / 110.0) as u32;
        assert!(decoded.width() <= max_dim);
        assert!(decoded.height() <= max_dim);
    }
}

#[tokio::test]
async fn test_download_serves_produced_archive() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let app = router(state);

    let image = png_bytes(32, 32);
    let (_, json) = post_upload(app.clone(), &[("images", "photo.png", &image)]).await;
    let archive_name = json["success"][0].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/download/{}", archive_name))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains(&archive_name));

    let served = response.into_body().collect().await.unwrap().to_bytes();
    let on_disk = std::fs::read(dir.path().join(&archive_name)).unwrap();
    assert_eq!(served.as_ref(), on_disk.as_slice());
}

#[tokio::test]
async fn test_download_missing_archive_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(dir.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/missing_00000000.zip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["message"], "archive not found");
    assert_eq!(json["code"], 404);
}

#[tokio::test]
async fn test_download_rejects_traversal_names() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("..secret.zip"), b"zip").unwrap();
    let app = router(test_state(dir.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/..secret.zip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_without_images_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(dir.path()));

    let (status, json) = post_upload(app, &[("other", "x.png", b"irrelevant")]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "no images provided");
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn test_mixed_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(test_state(dir.path()));

    let good = png_bytes(20, 20);
    let (status, json) = post_upload(
        app,
        &[
            ("images", "one.png", good.as_slice()),
            ("images", "two.png", b"definitely not an image"),
            ("images", "three.png", good.as_slice()),
        ],
    )
    .await;

    // Per-image failure is data: the batch still succeeds at the transport level.
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"].as_array().unwrap().len(), 2);
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    assert_eq!(json["errors"][0], "decode failure");
}
