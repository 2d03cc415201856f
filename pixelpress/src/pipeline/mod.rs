//! Per-image compression pipeline.
//!
//! Given one uploaded image, the pipeline decodes it, runs the resampler and
//! JPEG encoder concurrently for each configured quality tier, and funnels
//! the encoded variants into a single zip archive on disk.
//!
//! # Concurrency
//!
//! Tier encoding fans out to one task per tier, with the CPU-bound
//! resize/encode work delegated to the blocking pool. The first tier to fail
//! stores its error in a capacity-1 slot and cancels its siblings through a
//! per-image child token; any tier failure invalidates the whole image, so
//! errors are never aggregated. Archive mutation is never concurrent: a
//! single consumer task exclusively owns the [`zip::ZipWriter`] and drains
//! variants in whatever order they complete.
//!
//! A failed run never exposes a partial archive - the file is removed
//! best-effort before the error is returned.

mod naming;

pub use naming::{archive_filename, entry_filename, random_identifier};

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::encode::{default_tiers, encode_tier, EncodeError, QualityTier};

/// One encoded output of a quality tier, ready for archiving.
///
/// Ownership moves from the encoding task to the archive writer; variants
/// are never mutated after creation.
#[derive(Debug)]
pub struct EncodedVariant {
    /// Quality parameter of the tier that produced these bytes.
    pub quality: u8,
    /// The encoded JPEG data.
    pub bytes: Vec<u8>,
}

/// Errors that can occur while compressing one image.
///
/// The `Display` form of these errors is what callers report back to the
/// uploader, one line per failed image.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded bytes could not be decoded as an image.
    #[error("decode failure")]
    Decode(#[source] image::ImageError),

    /// The output directory or archive file could not be created.
    #[error("storage unavailable")]
    Storage(#[source] std::io::Error),

    /// A quality tier failed to encode; carries the first tier error only.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Writing an entry to the archive failed.
    #[error("archive write failure")]
    ArchiveWrite(#[source] zip::result::ZipError),

    /// A blocking-pool task was aborted or panicked.
    #[error("worker task failed")]
    Worker(#[source] tokio::task::JoinError),

    /// Processing was cancelled before the archive was complete.
    #[error("processing cancelled")]
    Cancelled,
}

/// Compresses one decoded image into a multi-tier zip archive.
///
/// The pipeline is cheap to clone (the tier set is shared) and carries no
/// per-request state; one instance serves all requests.
#[derive(Clone)]
pub struct ImagePipeline {
    output_dir: PathBuf,
    tiers: Arc<[QualityTier]>,
}

impl ImagePipeline {
    /// Create a pipeline writing archives into `output_dir` with the
    /// default quality tiers.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            tiers: default_tiers().into(),
        }
    }

    /// Replace the quality tier set.
    pub fn with_tiers(mut self, tiers: Vec<QualityTier>) -> Self {
        self.tiers = tiers.into();
        self
    }

    /// The directory archives are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Compress `data` into an archive of tier variants.
    ///
    /// On success returns the archive filename (relative to the output
    /// directory). On failure no usable archive remains on disk and the
    /// first error observed is returned.
    pub async fn compress(
        &self,
        name: &str,
        data: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        info!(image = %name, bytes = data.len(), "compressing image");

        let raster = task::spawn_blocking(move || {
            image::load_from_memory(&data).map(|decoded| decoded.to_rgba8())
        })
        .await
        .map_err(PipelineError::Worker)?
        .map_err(PipelineError::Decode)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(PipelineError::Storage)?;

        let archive_name = naming::archive_filename(name);
        let archive_path = self.output_dir.join(&archive_name);

        match self
            .encode_tiers(name, Arc::new(raster), &archive_path, cancel)
            .await
        {
            Ok(()) => {
                info!(image = %name, archive = %archive_name, "image compressed");
                Ok(archive_name)
            }
            Err(err) => {
                warn!(image = %name, error = %err, "image compression failed");
                if let Err(remove_err) = tokio::fs::remove_file(&archive_path).await {
                    debug!(
                        archive = %archive_path.display(),
                        error = %remove_err,
                        "could not remove partial archive"
                    );
                }
                Err(err)
            }
        }
    }

    /// Fan out tier encoding and drain the results into the archive.
    async fn encode_tiers(
        &self,
        name: &str,
        raster: Arc<RgbaImage>,
        archive_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let tier_cancel = cancel.child_token();
        let (variant_tx, variant_rx) = mpsc::channel::<EncodedVariant>(self.tiers.len().max(1));
        let (error_tx, mut error_rx) = mpsc::channel::<PipelineError>(1);

        let mut tiers = JoinSet::new();
        for &tier in self.tiers.iter() {
            if tier_cancel.is_cancelled() {
                break;
            }
            let raster = Arc::clone(&raster);
            let variant_tx = variant_tx.clone();
            let error_tx = error_tx.clone();
            let tier_cancel = tier_cancel.clone();
            tiers.spawn(async move {
                if tier_cancel.is_cancelled() {
                    return;
                }
                let encoded = task::spawn_blocking(move || encode_tier(&raster, tier)).await;
                let error = match encoded {
                    Ok(Ok(bytes)) => {
                        let variant = EncodedVariant {
                            quality: tier.quality(),
                            bytes,
                        };
                        let _ = variant_tx.send(variant).await;
                        return;
                    }
                    Ok(Err(err)) => PipelineError::Encode(err),
                    Err(join_err) => PipelineError::Worker(join_err),
                };
                // First error wins; later failures are dropped.
                let _ = error_tx.try_send(error);
                tier_cancel.cancel();
            });
        }
        // The writer terminates once every tier task has dropped its sender.
        drop(variant_tx);

        let writer = spawn_archive_writer(name, archive_path, variant_rx, tier_cancel.clone());

        while let Some(joined) = tiers.join_next().await {
            if let Err(join_err) = joined {
                let _ = error_tx.try_send(PipelineError::Worker(join_err));
                tier_cancel.cancel();
            }
        }
        drop(error_tx);

        let write_result = writer.await.map_err(PipelineError::Worker)?;

        if let Ok(err) = error_rx.try_recv() {
            return Err(err);
        }
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        write_result
    }
}

/// Spawn the single consumer task that owns the archive writer.
///
/// Zip writers are not safe for concurrent use, so all archive mutation
/// happens here, sequentially, on the blocking pool. Entries are written in
/// completion order; entry order inside the archive is unspecified.
fn spawn_archive_writer(
    name: &str,
    archive_path: &Path,
    mut variants: mpsc::Receiver<EncodedVariant>,
    cancel: CancellationToken,
) -> task::JoinHandle<Result<(), PipelineError>> {
    let name = name.to_string();
    let path = archive_path.to_path_buf();

    task::spawn_blocking(move || {
        let file = File::create(&path).map_err(PipelineError::Storage)?;
        let mut archive = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        while let Some(variant) = variants.blocking_recv() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let entry = naming::entry_filename(&name, variant.quality);
            archive
                .start_file(entry, options)
                .map_err(PipelineError::ArchiveWrite)?;
            archive
                .write_all(&variant.bytes)
                .map_err(|err| PipelineError::ArchiveWrite(err.into()))?;
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        // Flushes the central directory.
        archive.finish().map_err(PipelineError::ArchiveWrite)?;
        Ok(())
    })
}
