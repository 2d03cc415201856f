//! Raster resampling.
//!
//! This module provides the bilinear resampler used to shrink decoded
//! images before tier encoding. The resampler is a pure function over
//! [`image::RgbaImage`] - no shared state, safe to run concurrently across
//! independent calls.

mod resample;

pub use resample::{resize_bilinear, scaled_dimensions};
