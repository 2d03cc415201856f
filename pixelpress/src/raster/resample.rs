//! Bilinear image resampling.
//!
//! For each destination pixel the continuous source coordinate is computed,
//! the four neighboring source pixels are sampled (clamped at the image
//! edge, never wrapping or reading out of bounds), and the channels are
//! blended with bilinear weights. Blending happens in `f64`; the final
//! channel value is truncated to 8 bits, not rounded.

use image::{Rgba, RgbaImage};

/// Apply a scale factor to image dimensions.
///
/// Each resulting dimension is clamped to a minimum of 1 pixel so that an
/// aggressive scale factor can never produce an empty raster.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale) as u32;
    let h = (height as f64 * scale) as u32;
    (w.max(1), h.max(1))
}

/// Resize `src` to `target_width` x `target_height` using bilinear
/// interpolation.
///
/// Target dimensions are clamped to a minimum of 1 pixel. Resizing an image
/// to its own dimensions reproduces it exactly: the interpolation weights
/// collapse to identity when source and target coordinates coincide.
pub fn resize_bilinear(src: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    let target_width = target_width.max(1);
    let target_height = target_height.max(1);

    let src_width = src.width();
    let src_height = src.height();

    let scale_x = src_width as f64 / target_width as f64;
    let scale_y = src_height as f64 / target_height as f64;

    let mut dst = RgbaImage::new(target_width, target_height);

    for y in 0..target_height {
        for x in 0..target_width {
            let src_x = x as f64 * scale_x;
            let src_y = y as f64 * scale_y;

            let x1 = src_x as u32;
            let y1 = src_y as u32;
            let x2 = (x1 + 1).min(src_width - 1);
            let y2 = (y1 + 1).min(src_height - 1);

            let wx = src_x - x1 as f64;
            let wy = src_y - y1 as f64;

            let top = blend_horizontal(src.get_pixel(x1, y1), src.get_pixel(x2, y1), wx);
            let bottom = blend_horizontal(src.get_pixel(x1, y2), src.get_pixel(x2, y2), wx);

            let mut channels = [0u8; 4];
            for (i, channel) in channels.iter_mut().enumerate() {
                let value = top[i] * (1.0 - wy) + bottom[i] * wy;
                *channel = value as u8;
            }
            dst.put_pixel(x, y, Rgba(channels));
        }
    }
    dst
}

/// Blend two horizontally adjacent pixels per RGBA channel.
fn blend_horizontal(left: &Rgba<u8>, right: &Rgba<u8>, weight: f64) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (i, value) in out.iter_mut().enumerate() {
        *value = left.0[i] as f64 * (1.0 - weight) + right.0[i] as f64 * weight;
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any target dimensions >= 1x1 produce a raster of exactly those
        /// dimensions without panicking (edge clamping keeps every sampled
        /// coordinate inside the source).
        #[test]
        fn prop_resize_never_reads_out_of_bounds(
            (src_w, src_h) in (1u32..=32, 1u32..=32),
            (dst_w, dst_h) in (1u32..=64, 1u32..=64),
        ) {
            let src = RgbaImage::from_fn(src_w, src_h, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
            });
            let dst = resize_bilinear(&src, dst_w, dst_h);
            prop_assert_eq!(dst.width(), dst_w);
            prop_assert_eq!(dst.height(), dst_h);
        }

        /// Blended output channels never exceed the channel range spanned by
        /// the source (bilinear interpolation cannot overshoot; truncation
        /// may lose at most one level at the low end).
        #[test]
        fn prop_output_within_source_channel_range(
            value_lo in 1u8..=100,
            value_hi in 150u8..=255,
            (dst_w, dst_h) in (1u32..=16, 1u32..=16),
        ) {
            let src = RgbaImage::from_fn(8, 8, |x, y| {
                let v = if (x + y) % 2 == 0 { value_lo } else { value_hi };
                Rgba([v, v, v, 255])
            });
            let dst = resize_bilinear(&src, dst_w, dst_h);
            for pixel in dst.pixels() {
                for c in 0..3 {
                    prop_assert!(pixel.0[c] >= value_lo - 1 && pixel.0[c] <= value_hi);
                }
            }
        }

        /// The identity property holds for arbitrary dimensions.
        #[test]
        fn prop_identity_resize((w, h) in (1u32..=24, 1u32..=24)) {
            let src = RgbaImage::from_fn(w, h, |x, y| {
                Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 77, 255])
            });
            let dst = resize_bilinear(&src, w, h);
            prop_assert_eq!(src, dst);
        }

        /// Scaled dimensions are never zero.
        #[test]
        fn prop_scaled_dimensions_nonzero(
            (w, h) in (1u32..=4096, 1u32..=4096),
            quality in 1u8..=100,
        ) {
            let (sw, sh) = scaled_dimensions(w, h, quality as f64 / 110.0);
            prop_assert!(sw >= 1 && sh >= 1);
        }
    }
}
