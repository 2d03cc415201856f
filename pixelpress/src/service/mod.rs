//! Per-request orchestration.
//!
//! [`CompressionService`] runs one compression pipeline per uploaded file,
//! concurrently, and aggregates the outcomes into a [`BatchResponse`].
//!
//! Failure domains are isolated per file: one image failing to decode or
//! encode never cancels another image's pipeline. The only cancellation
//! that crosses images is the request token itself (client disconnect or
//! shutdown), which both stops new pipelines from starting and aborts
//! in-flight ones at their next check.

use std::path::Path;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::encode::QualityTier;
use crate::pipeline::ImagePipeline;

/// One uploaded file, decoupled from the HTTP layer.
#[derive(Debug)]
pub struct UploadedImage {
    /// Display name: the uploaded filename stem, free of path separators.
    pub name: String,
    /// Raw uploaded bytes, not yet decoded.
    pub data: Vec<u8>,
}

/// Aggregated outcome of one upload batch.
///
/// Every image that started processing lands in exactly one list; insertion
/// order follows completion order and carries no meaning beyond the
/// success/error partition. Images skipped because the request was already
/// cancelled appear in neither list.
#[derive(Debug, Default, Serialize)]
pub struct BatchResponse {
    /// Archive filenames of successfully compressed images.
    pub success: Vec<String>,
    /// One message per failed image.
    pub errors: Vec<String>,
}

/// Orchestrates compression pipelines across the files of one request.
pub struct CompressionService {
    pipeline: ImagePipeline,
}

impl CompressionService {
    /// Create a service writing archives into `output_dir` with the default
    /// quality tiers.
    pub fn new(output_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            pipeline: ImagePipeline::new(output_dir),
        }
    }

    /// Replace the quality tier set used for every image.
    pub fn with_tiers(mut self, tiers: Vec<QualityTier>) -> Self {
        self.pipeline = self.pipeline.with_tiers(tiers);
        self
    }

    /// The directory archives are written to.
    pub fn output_dir(&self) -> &Path {
        self.pipeline.output_dir()
    }

    /// Process a batch of uploaded files.
    ///
    /// Spawns one independent pipeline task per file, skipping files whose
    /// task has not started once `cancel` fires, then waits for every
    /// spawned task to report before returning. Never blocks indefinitely:
    /// each pipeline terminates, so the drain does too.
    pub async fn process_batch(
        &self,
        images: Vec<UploadedImage>,
        cancel: &CancellationToken,
    ) -> BatchResponse {
        info!(files = images.len(), "processing upload batch");

        let (outcome_tx, mut outcome_rx) = mpsc::channel(images.len().max(1));

        for image in images {
            if cancel.is_cancelled() {
                debug!("request cancelled, not starting remaining images");
                break;
            }
            let pipeline = self.pipeline.clone();
            let cancel = cancel.clone();
            let outcome_tx = outcome_tx.clone();
            tokio::spawn(async move {
                if cancel.is_cancelled() {
                    return;
                }
                let outcome = pipeline.compress(&image.name, image.data, &cancel).await;
                let _ = outcome_tx.send(outcome).await;
            });
        }
        drop(outcome_tx);

        let mut response = BatchResponse::default();
        while let Some(outcome) = outcome_rx.recv().await {
            match outcome {
                Ok(archive) => response.success.push(archive),
                Err(err) => response.errors.push(err.to_string()),
            }
        }

        info!(
            success = response.success.len(),
            errors = response.errors.len(),
            "batch complete"
        );
        response
    }
}
