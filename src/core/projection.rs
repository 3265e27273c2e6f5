use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::core::face::CubeFace;
use crate::core::image_buffer::ImageBuffer;
use crate::core::math::cubemap::{
    cubemap_uv_to_lat_long, euclidean_to_cubemap_face_uv, face_texel, lat_long_to_cubemap_uv,
    target_size_for_cubemap,
};
use crate::core::math::spherical::{
    lat_long_to_euclidean, lat_long_to_uv, target_size_for_lat_long, uv_to_lat_long,
};
use crate::core::math::vector::Vec2;

/// How a panorama is laid out on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Equirectangular: azimuth across, polar angle down.
    #[default]
    #[serde(alias = "lat-long", alias = "equirect", alias = "equirectangular")]
    LatLong,
    /// Six square faces side by side in [`CubeFace`] order.
    #[serde(alias = "cube")]
    Cubemap,
}

/// How a cubemap is stored: one `6h x h` strip or six `h x h` images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CubemapLayout {
    #[default]
    Strip,
    #[serde(alias = "faces")]
    SeparateFaces,
}

impl Projection {
    /// Sheet size that holds about `pixel_count` pixels in this projection.
    pub fn target_size(self, pixel_count: usize) -> (usize, usize) {
        match self {
            Projection::LatLong => target_size_for_lat_long(pixel_count),
            Projection::Cubemap => target_size_for_cubemap(pixel_count),
        }
    }

    /// Sheet coordinate to `(theta, phi)`.
    #[inline]
    pub fn uv_to_lat_long(self, uv: &Vec2) -> Vec2 {
        match self {
            Projection::LatLong => uv_to_lat_long(uv),
            Projection::Cubemap => cubemap_uv_to_lat_long(uv),
        }
    }

    /// `(theta, phi)` to sheet coordinate.
    #[inline]
    pub fn lat_long_to_uv(self, angles: &Vec2) -> Vec2 {
        match self {
            Projection::LatLong => lat_long_to_uv(angles),
            Projection::Cubemap => lat_long_to_cubemap_uv(angles),
        }
    }

    /// Fetches the source pixel seen in direction `(theta, phi)`.
    ///
    /// Lat-long sheets go through the wraparound sampler. Cubemap strips are
    /// addressed per face so a lookup on a face border stays on that face.
    #[inline]
    pub fn sample<'a>(self, src: &'a ImageBuffer, angles: &Vec2) -> &'a [u8] {
        match self {
            Projection::LatLong => src.sample(&self.lat_long_to_uv(angles)),
            Projection::Cubemap => {
                let dir = lat_long_to_euclidean(angles);
                let (face, uv) = euclidean_to_cubemap_face_uv(&dir);
                let (col, row) = face_texel(face, &uv, src.height());
                src.pixel(col, row)
            }
        }
    }

    /// Whether a `width x height` sheet is a valid layout for this projection.
    pub fn accepts(self, width: usize, height: usize) -> bool {
        match self {
            Projection::LatLong => width > 0 && height > 0,
            Projection::Cubemap => height > 0 && width == height * CubeFace::COUNT,
        }
    }
}

impl FromStr for Projection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latlong" | "lat-long" | "equirect" | "equirectangular" => Ok(Projection::LatLong),
            "cubemap" | "cube" => Ok(Projection::Cubemap),
            other => Err(format!("unknown projection '{other}' (expected latlong or cubemap)")),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::LatLong => write!(f, "latlong"),
            Projection::Cubemap => write!(f, "cubemap"),
        }
    }
}

impl FromStr for CubemapLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strip" => Ok(CubemapLayout::Strip),
            "separate-faces" | "faces" => Ok(CubemapLayout::SeparateFaces),
            other => Err(format!(
                "unknown cubemap layout '{other}' (expected strip or separate-faces)"
            )),
        }
    }
}

impl fmt::Display for CubemapLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CubemapLayout::Strip => write!(f, "strip"),
            CubemapLayout::SeparateFaces => write!(f, "separate-faces"),
        }
    }
}

/// One conversion run: source projection, target projection, and how any
/// cubemap on either side is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub from: Projection,
    pub to: Projection,
    pub layout: CubemapLayout,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            from: Projection::LatLong,
            to: Projection::Cubemap,
            layout: CubemapLayout::Strip,
        }
    }
}

impl Conversion {
    /// Whether the input is a set of six face files.
    pub fn reads_faces(&self) -> bool {
        self.from == Projection::Cubemap && self.layout == CubemapLayout::SeparateFaces
    }

    /// Whether the output is a set of six face files.
    pub fn writes_faces(&self) -> bool {
        self.to == Projection::Cubemap && self.layout == CubemapLayout::SeparateFaces
    }
}
