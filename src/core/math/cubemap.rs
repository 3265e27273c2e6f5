//! Cubemap face orientation and strip addressing.
//!
//! A face coordinate `(u, v)` in `[0, 1)²` is remapped to `u' = 2u - 1`,
//! `v' = 2v - 1` and then placed on the unit cube:
//!
//! | face | direction      |
//! |------|----------------|
//! | +X   | (1, -v', u')   |
//! | -X   | (-1, -v', -u') |
//! | +Y   | (-u', 1, v')   |
//! | -Y   | (-u', -1, -v') |
//! | +Z   | (-u', -v', 1)  |
//! | -Z   | (u', -v', -1)  |
//!
//! A strip stores the six faces left to right in [`CubeFace`] order, so the
//! sheet is `6h` wide and `h` tall.

use super::spherical::{euclidean_to_lat_long, lat_long_to_euclidean};
use super::vector::{Vec2, Vec3};
use crate::core::face::CubeFace;

const FACES: f32 = CubeFace::COUNT as f32;

/// Largest f32 below 1.0.
const ONE_BELOW: f32 = 1.0 - f32::EPSILON / 2.0;

/// Maps a face-local coordinate to a (non-normalized) direction.
#[inline]
pub fn cubemap_face_uv_to_euclidean(uv: &Vec2, face: CubeFace) -> Vec3 {
    let u = uv.x * 2.0 - 1.0;
    let v = uv.y * 2.0 - 1.0;
    match face {
        CubeFace::PosX => Vec3::new(1.0, -v, u),
        CubeFace::NegX => Vec3::new(-1.0, -v, -u),
        CubeFace::PosY => Vec3::new(-u, 1.0, v),
        CubeFace::NegY => Vec3::new(-u, -1.0, -v),
        CubeFace::PosZ => Vec3::new(-u, -v, 1.0),
        CubeFace::NegZ => Vec3::new(u, -v, -1.0),
    }
}

/// Splits a strip coordinate into its face and the face-local coordinate.
#[inline]
pub fn strip_uv_to_face_uv(uv: &Vec2) -> (CubeFace, Vec2) {
    let x = uv.x * FACES;
    let whole = x.floor();
    // u == 1.0 lands on face 6
    let index = (whole as i64).rem_euclid(CubeFace::COUNT as i64) as usize;
    let face = CubeFace::from_index(index).unwrap_or(CubeFace::PosX);
    (face, Vec2::new(x - whole, uv.y))
}

/// Maps a strip coordinate to a direction.
#[inline]
pub fn cubemap_uv_to_euclidean(uv: &Vec2) -> Vec3 {
    let (face, face_uv) = strip_uv_to_face_uv(uv);
    cubemap_face_uv_to_euclidean(&face_uv, face)
}

/// Maps a face-local coordinate to `(theta, phi)`.
#[inline]
pub fn cubemap_face_uv_to_lat_long(uv: &Vec2, face: CubeFace) -> Vec2 {
    euclidean_to_lat_long(&cubemap_face_uv_to_euclidean(uv, face))
}

/// Maps a strip coordinate to `(theta, phi)`.
#[inline]
pub fn cubemap_uv_to_lat_long(uv: &Vec2) -> Vec2 {
    euclidean_to_lat_long(&cubemap_uv_to_euclidean(uv))
}

/// Finds the face a direction points through and the face-local coordinate
/// of that point. Inverse of [`cubemap_face_uv_to_euclidean`].
///
/// The dominant axis picks the face; ties go to X, then Y, then Z.
/// Both coordinates are clamped to `[0, 1]`.
pub fn euclidean_to_cubemap_face_uv(dir: &Vec3) -> (CubeFace, Vec2) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());

    let (face, u, v) = if ax >= ay && ax >= az {
        if dir.x >= 0.0 {
            (CubeFace::PosX, dir.z / ax, -dir.y / ax)
        } else {
            (CubeFace::NegX, -dir.z / ax, -dir.y / ax)
        }
    } else if ay >= az {
        if dir.y >= 0.0 {
            (CubeFace::PosY, -dir.x / ay, dir.z / ay)
        } else {
            (CubeFace::NegY, -dir.x / ay, -dir.z / ay)
        }
    } else if dir.z >= 0.0 {
        (CubeFace::PosZ, -dir.x / az, -dir.y / az)
    } else {
        (CubeFace::NegZ, dir.x / az, -dir.y / az)
    };

    let uv = Vec2::new(
        ((u + 1.0) * 0.5).clamp(0.0, 1.0),
        ((v + 1.0) * 0.5).clamp(0.0, 1.0),
    );
    (face, uv)
}

/// Maps `(theta, phi)` to a strip coordinate.
///
/// The face-local `u` is kept below 1 so the result stays inside the face's
/// column band.
pub fn lat_long_to_cubemap_uv(angles: &Vec2) -> Vec2 {
    let (face, uv) = euclidean_to_cubemap_face_uv(&lat_long_to_euclidean(angles));
    let u = uv.x.min(ONE_BELOW);
    Vec2::new((face.index() as f32 + u) / FACES, uv.y)
}

/// Nearest texel `(col, row)` of a face inside a strip whose faces are
/// `face_size` pixels square.
///
/// Rounds like the lat-long sampler but clamps at the face border instead of
/// wrapping, so a lookup never bleeds into a neighbouring face.
#[inline]
pub fn face_texel(face: CubeFace, uv: &Vec2, face_size: usize) -> (usize, usize) {
    let last = face_size.saturating_sub(1);
    let col = ((uv.x * face_size as f32).round() as usize).min(last);
    let row = ((uv.y * face_size as f32).round() as usize).min(last);
    (face.index() * face_size + col, row)
}

/// Strip size `(6h, h)` holding roughly `pixel_count` pixels.
pub fn target_size_for_cubemap(pixel_count: usize) -> (usize, usize) {
    let h = ((pixel_count as f32 / FACES).sqrt().round() as usize).max(1);
    (h * CubeFace::COUNT, h)
}
