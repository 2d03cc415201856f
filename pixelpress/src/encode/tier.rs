//! Quality tier configuration.

/// Default quality tiers produced for every uploaded image.
pub const DEFAULT_QUALITIES: [u8; 3] = [50, 70, 90];

/// One quality tier: a JPEG quality parameter plus the derived scale factor
/// applied to the source dimensions before encoding.
///
/// The scale is `quality / 110`, so a higher requested quality also means a
/// less aggressive downscale. Tiers are fixed at construction; there is no
/// runtime mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityTier {
    quality: u8,
}

impl QualityTier {
    /// Create a tier for the given JPEG quality (0-100 scale).
    ///
    /// The value is validated against the encoder's accepted range when the
    /// tier is actually encoded, not here.
    pub const fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// The JPEG quality parameter.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Scale factor applied to source dimensions before encoding.
    pub fn scale(&self) -> f64 {
        self.quality as f64 / 110.0
    }
}

/// The default tier set, ordered by ascending quality.
pub fn default_tiers() -> Vec<QualityTier> {
    DEFAULT_QUALITIES.iter().copied().map(QualityTier::new).collect()
}
