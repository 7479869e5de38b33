use std::ops::RangeInclusive;

pub const MIN_PRECISION: u8 = 1;
pub const MAX_PRECISION: u8 = 10;

/// Rounds half away from zero at `precision` decimal digits. Negative zero
/// collapses to zero so printed output never shows `-0.000`.
pub fn round_to_precision(x: f64, precision: u8) -> f64 {
    let scale = 10f64.powi(precision.clamp(0, MAX_PRECISION) as i32);
    let rounded = (x * scale).round() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Maps `x` from `range` onto [-1, 1] without clamping. Callers guarantee a
/// non-empty range.
pub fn remap_snorm(x: f64, range: RangeInclusive<f64>) -> f64 {
    2.0 * (x - range.start()) / (range.end() - range.start()) - 1.0
}

pub fn snorm_clamped(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}
