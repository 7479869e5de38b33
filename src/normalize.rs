use crate::{
    remap_snorm, round_to_precision, snorm_clamped, ChannelBounds, ExportError,
    NormalizationBounds, TransformSample, MAX_PRECISION, MIN_PRECISION,
};

/// Rounds raw values, or remaps them onto [-1, 1] first
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Normalizer {
    precision: u8,
}

impl Normalizer {
    pub fn new(precision: u8) -> Result<Self, ExportError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(ExportError::InvalidPrecision {
                value: precision,
                min: MIN_PRECISION,
                max: MAX_PRECISION,
            });
        }
        Ok(Self { precision })
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn round(&self, value: f64) -> f64 {
        round_to_precision(value, self.precision)
    }

    pub fn normalize(&self, value: f64, bounds: &ChannelBounds) -> f64 {
        self.round(snorm_clamped(remap_snorm(value, bounds.range())))
    }

    pub fn round_sample(&self, sample: &TransformSample) -> TransformSample {
        sample.map_channels(|_, value| self.round(value))
    }

    pub fn normalize_sample(
        &self,
        sample: &TransformSample,
        bounds: &NormalizationBounds,
    ) -> TransformSample {
        sample.map_channels(|channel, value| self.normalize(value, bounds.channel(channel)))
    }
}
