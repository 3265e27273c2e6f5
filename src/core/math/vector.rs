use nalgebra::{Vector2, Vector3};

/// Normalized texture coordinate, or a `(theta, phi)` angle pair.
pub type Vec2 = Vector2<f32>;
/// Point or direction in Euclidean space.
pub type Vec3 = Vector3<f32>;

/// The +Y pole every polar angle is measured from.
pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Returns `v` scaled to unit length.
///
/// A zero-length input has no direction; callers must never pass one.
#[inline]
pub fn normalized(v: &Vec3) -> Vec3 {
    debug_assert!(v.norm_squared() > 0.0, "cannot normalize a zero-length vector");
    v / v.norm()
}

/// Reduces any real into `[0, 1)` so texture coordinates repeat.
///
/// e.g. `1.25 -> 0.25`, `-0.25 -> 0.75`.
#[inline(always)]
pub fn warp(v: f32) -> f32 {
    let w = v - v.floor();
    // -tiny - floor(-tiny) rounds to exactly 1.0 in f32
    if w >= 1.0 { 0.0 } else { w }
}
