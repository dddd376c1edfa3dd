//! Two-link inverse kinematics
use nalgebra::Vector3;

/// Elbow position for a two-link chain based at the origin with link
/// lengths `a` and `b`, reaching for `reach`. The elbow bends towards the
/// side of `hint`.
///
/// Targets out of range leave the elbow on the line to `reach`. A zero
/// `reach`, or a `hint` parallel to it, yields NaNs.
pub fn two_link_elbow(a: f32, b: f32, reach: Vector3<f32>, hint: Vector3<f32>) -> Vector3<f32> {
    let c = reach.norm_squared();
    let x = ((a * a - b * b) / c + 1.0) / 2.0;
    let side = hint - reach * (reach.dot(&hint) / c);
    let y = ((a * a - x * x * c).max(0.0) / side.norm_squared()).sqrt();
    reach * x + side * y
}
