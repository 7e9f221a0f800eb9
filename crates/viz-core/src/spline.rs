//! Cubic Hermite evaluation over a sequence of points.
//!
//! The curve through `P[0..M]` is split into `M - 1` equal-parameter segments.
//! Each segment starts with the forward difference to the next point and ends
//! with the two-step difference `P[seg + 2] - P[seg]`, or zero on the final
//! segment. The packer bakes the same forward differences into the texture, so
//! both paths must go through [`forward_tangent`].

use crate::error::{Result, VizError};
use std::ops::{Add, Mul, Sub};

/// Anything that can be blended by the Hermite basis.
pub trait HermitePoint:
    Copy + Default + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
}

impl<T> HermitePoint for T where
    T: Copy + Default + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>
{
}

/// The four Hermite basis weights at local parameter `s`.
#[inline]
pub fn hermite_basis(s: f32) -> [f32; 4] {
    let s2 = s * s;
    let s3 = s2 * s;
    [
        2.0 * s3 - 3.0 * s2 + 1.0,
        -2.0 * s3 + 3.0 * s2,
        s3 - 2.0 * s2 + s,
        s3 - s2,
    ]
}

/// Single Hermite segment from `point0` (leaving along `tangent0`) to `point1`
/// (arriving along `tangent1`).
#[inline]
pub fn hermite<T: HermitePoint>(point0: T, tangent0: T, point1: T, tangent1: T, s: f32) -> T {
    let [h1, h2, h3, h4] = hermite_basis(s);
    point0 * h1 + point1 * h2 + tangent0 * h3 + tangent1 * h4
}

/// Tangent leaving `points[k]`: `points[k + 1] - points[k]`, zero at the last point.
#[inline]
pub fn forward_tangent<T: HermitePoint>(points: &[T], k: usize) -> T {
    match (points.get(k), points.get(k + 1)) {
        (Some(&here), Some(&next)) => next - here,
        _ => T::default(),
    }
}

/// Segment index and local parameter for global parameter `t` over
/// `num_points` points.
///
/// The segment is clamped so `t == 1.0` lands at the end of the last segment
/// (`s == 1`) instead of one past it.
pub fn locate_segment(num_points: usize, t: f32) -> Result<(usize, f32)> {
    if num_points < 2 {
        return Err(VizError::MalformedSequence { len: num_points });
    }
    let num_segments = num_points - 1;
    let scaled = t * num_segments as f32;
    // floor of a negative t saturates to segment 0
    let segment = (scaled.floor() as usize).min(num_segments - 1);
    let s = scaled - segment as f32;
    debug_assert!(segment < num_segments);
    Ok((segment, s))
}

/// Evaluate the curve through `points` at `t` in \[0, 1\].
pub fn evaluate<T: HermitePoint>(points: &[T], t: f32) -> Result<T> {
    let (segment, s) = locate_segment(points.len(), t)?;
    let tangent0 = forward_tangent(points, segment);
    let tangent1 = match points.get(segment + 2) {
        Some(&far) => far - points[segment],
        None => T::default(),
    };
    Ok(hermite(
        points[segment],
        tangent0,
        points[segment + 1],
        tangent1,
        s,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn basis_partitions_unity_on_positions() {
        for i in 0..=10 {
            let [h1, h2, _, _] = hermite_basis(i as f32 / 10.0);
            assert!((h1 + h2 - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn scalar_curve_is_supported() {
        let v = evaluate(&[0.0f32, 1.0], 0.5).unwrap();
        // tangent0 = 1, tangent1 = 0: 0.5 + 0.125 * 1
        assert!((v - 0.625).abs() < 1e-6);
    }

    #[test]
    fn forward_tangent_is_zero_past_end() {
        let pts = [Vec2::ZERO, Vec2::ONE];
        assert_eq!(forward_tangent(&pts, 0), Vec2::ONE);
        assert_eq!(forward_tangent(&pts, 1), Vec2::ZERO);
    }
}
