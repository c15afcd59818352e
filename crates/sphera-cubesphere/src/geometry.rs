//! Scalar and segment helpers shared by the LOD and culling code.

use glam::DVec3;

/// Segments shorter than this (squared) have no usable direction.
const DEGENERATE_SEGMENT_SQ: f64 = 1e-4;

/// Parameter `u` of the point on the line `p0 + u * (p1 - p0)` closest to `p`.
///
/// `u` is not clamped to the segment. Returns `None` when `p0` and `p1`
/// nearly coincide.
#[must_use]
pub fn find_closest_point(p0: DVec3, p1: DVec3, p: DVec3) -> Option<f64> {
    let d = p1 - p0;
    let denom = d.length_squared();
    if denom < DEGENERATE_SEGMENT_SQ {
        return None;
    }
    Some((p - p0).dot(d) / denom)
}

/// Clamp to `[0, 1]`. NaN maps to 0.
#[must_use]
pub fn saturate(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
