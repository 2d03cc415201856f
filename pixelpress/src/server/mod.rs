//! HTTP surface: upload and download routes.
//!
//! `POST /upload` accepts a multipart form with one or more files under the
//! `images` field and responds with the batch's success/error partition.
//! A created status is returned even when every image failed - per-image
//! failure is data, not a transport error. Only input validation (empty or
//! oversized uploads) is rejected at the transport level.
//!
//! `GET /download/{name}` streams a previously produced archive from the
//! output directory.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::service::{CompressionService, UploadedImage};

/// Maximum accepted total upload size: 50 MiB.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Multipart field name carrying the uploaded files.
const IMAGES_FIELD: &str = "images";

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<CompressionService>,
    output_dir: PathBuf,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create handler state.
    ///
    /// `shutdown` is the application-level token; every request derives a
    /// child token from it so that both shutdown and client disconnects
    /// cancel in-flight pipelines.
    pub fn new(
        service: Arc<CompressionService>,
        output_dir: PathBuf,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            output_dir,
            shutdown,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/download/:name", get(download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Errors surfaced to HTTP clients as `{"message", "code"}` JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The multipart body could not be read or exceeded the size limit.
    #[error("too many images")]
    TooManyImages,

    /// The `images` field was missing or empty.
    #[error("no images provided")]
    NoImages,

    /// The requested archive does not exist (or the name was unsafe).
    #[error("archive not found")]
    NotFound,

    /// The archive exists but could not be opened.
    #[error("failed to open archive")]
    OpenFailed,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::TooManyImages | ApiError::NoImages => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::OpenFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// `POST /upload` - compress every uploaded image into a tier archive.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut images = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                debug!(error = %err, "failed to read multipart body");
                return Err(ApiError::TooManyImages);
            }
        };
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        let name = display_name(field.file_name());
        let data = field.bytes().await.map_err(|err| {
            debug!(error = %err, "failed to read upload field");
            ApiError::TooManyImages
        })?;
        images.push(UploadedImage {
            name,
            data: data.to_vec(),
        });
    }

    if images.is_empty() {
        return Err(ApiError::NoImages);
    }

    // Dropping the guard - on client disconnect or handler completion -
    // cancels the request token and with it any in-flight pipelines.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let response = state.service.process_batch(images, &cancel).await;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// `GET /download/{name}` - stream a produced archive.
async fn download(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
) -> Result<Response, ApiError> {
    if !is_safe_archive_name(&name) {
        debug!(name = %name, "rejected unsafe archive name");
        return Err(ApiError::NotFound);
    }

    let path = state.output_dir.join(&name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound);
        }
        Err(err) => {
            warn!(archive = %path.display(), error = %err, "failed to open archive");
            return Err(ApiError::OpenFailed);
        }
    };

    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        )
        .body(body)
        .map_err(|_| ApiError::OpenFailed)
}

/// Derive the display name from an uploaded filename: the stem of its last
/// path component, so produced archive names never contain separators.
fn display_name(file_name: Option<&str>) -> String {
    file_name
        .map(std::path::Path::new)
        .and_then(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Reject names that could escape the output directory.
fn is_safe_archive_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}
