//! JPEG encoding of a resized raster at one quality tier.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use thiserror::Error;

use crate::raster::{resize_bilinear, scaled_dimensions};

use super::QualityTier;

/// Errors that can occur while encoding one quality tier.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The quality parameter is outside the encoder's accepted range.
    #[error("quality {quality} outside supported range 1-100")]
    InvalidQuality { quality: u8 },

    /// The underlying JPEG encoder failed.
    #[error("jpeg encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Resize `src` by the tier's scale factor and encode it as JPEG at the
/// tier's quality.
///
/// Returns the encoded bytes; the only side effect is the allocation of the
/// output buffer.
pub fn encode_tier(src: &RgbaImage, tier: QualityTier) -> Result<Vec<u8>, EncodeError> {
    let quality = tier.quality();
    if quality == 0 || quality > 100 {
        return Err(EncodeError::InvalidQuality { quality });
    }

    let (width, height) = scaled_dimensions(src.width(), src.height(), tier.scale());
    let resized = resize_bilinear(src, width, height);

    // JPEG carries no alpha channel.
    let rgb = DynamicImage::ImageRgba8(resized).to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;

    Ok(buffer.into_inner())
}
