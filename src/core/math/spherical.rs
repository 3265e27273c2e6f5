//! Spherical (lat-long) coordinate conventions.
//!
//! Azimuth `theta` is measured from +X toward +Z and covers `(-PI, PI]`.
//! Polar angle `phi` is measured from the +Y pole toward -Y and covers `[0, PI]`.
//! Both angles travel together in a [`Vec2`] as `(theta, phi)`.

use std::f32::consts::{PI, TAU};

use super::vector::{UP, Vec2, Vec3, normalized};

/// Converts a direction into `(theta, phi)`.
#[inline]
pub fn euclidean_to_lat_long(dir: &Vec3) -> Vec2 {
    let theta = dir.z.atan2(dir.x);
    // Rounding can push the dot product a hair past +-1
    let phi = normalized(dir).dot(&UP).clamp(-1.0, 1.0).acos();
    Vec2::new(theta, phi)
}

/// Converts `(theta, phi)` back into a unit direction.
#[inline]
pub fn lat_long_to_euclidean(angles: &Vec2) -> Vec3 {
    let (sin_theta, cos_theta) = angles.x.sin_cos();
    let (sin_phi, cos_phi) = angles.y.sin_cos();
    Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta)
}

/// Maps `(theta, phi)` to a lat-long texture coordinate.
///
/// `x` is negative for the western half of the sphere; the sampler wraps it.
#[inline]
pub fn lat_long_to_uv(angles: &Vec2) -> Vec2 {
    Vec2::new(angles.x / TAU, angles.y / PI)
}

/// Maps a lat-long texture coordinate to `(theta, phi)`.
#[inline]
pub fn uv_to_lat_long(uv: &Vec2) -> Vec2 {
    Vec2::new(uv.x * TAU, uv.y * PI)
}

/// Sheet size `(2h, h)` holding roughly `pixel_count` pixels.
pub fn target_size_for_lat_long(pixel_count: usize) -> (usize, usize) {
    let h = ((pixel_count as f32 / 2.0).sqrt().round() as usize).max(1);
    (h * 2, h)
}
