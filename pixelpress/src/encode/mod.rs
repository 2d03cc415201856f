//! Quality tiers and lossy encoding.
//!
//! A [`QualityTier`] couples a JPEG quality parameter with the scale factor
//! applied to the source raster before encoding. [`encode_tier`] produces
//! the encoded byte buffer for one tier; it never touches the filesystem.

mod jpeg;
mod tier;

pub use jpeg::{encode_tier, EncodeError};
pub use tier::{default_tiers, QualityTier, DEFAULT_QUALITIES};
