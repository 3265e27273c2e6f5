use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;

use crate::core::face::CubeFace;
use crate::core::image_buffer::{ImageBuffer, copy_pixel};
use crate::core::math::cubemap::cubemap_uv_to_lat_long;
use crate::core::math::vector::Vec2;
use crate::core::projection::{Conversion, Projection};
use crate::error::ConvertError;

/// Result of one conversion: a single sheet, or six faces in [`CubeFace`] order.
#[derive(Debug)]
pub enum Rendered {
    Sheet(ImageBuffer),
    Faces(Vec<ImageBuffer>),
}

/// Normalized coordinate of the center of pixel `(col, row)`.
#[inline(always)]
pub fn pixel_center(col: usize, row: usize, width: usize, height: usize) -> Vec2 {
    Vec2::new(
        (col as f32 + 0.5) / width as f32,
        (row as f32 + 0.5) / height as f32,
    )
}

/// Direction seen by pixel `(col, row)` of `face` in a cubemap with
/// `face_size` square faces.
///
/// Always goes through the strip coordinate, the same float path
/// [`render`] takes, so every cubemap driver picks identical source texels.
#[inline(always)]
fn cube_pixel_lat_long(face: CubeFace, col: usize, row: usize, face_size: usize) -> Vec2 {
    let uv = pixel_center(
        face.index() * face_size + col,
        row,
        face_size * CubeFace::COUNT,
        face_size,
    );
    cubemap_uv_to_lat_long(&uv)
}

/// Size of the sheet `to` needs to hold roughly as many pixels as `src`.
pub fn destination_size(src: &ImageBuffer, to: Projection) -> (usize, usize) {
    to.target_size(src.pixel_count())
}

/// Resamples `src` (laid out as `from`) into `dst` (laid out as `to`).
///
/// Every destination pixel is visited once: its center goes through
/// `to.uv_to_lat_long`, and the source pixel seen in that direction is copied
/// over. Rows are spread over the rayon pool; each worker owns its rows.
pub fn render(src: &ImageBuffer, from: Projection, dst: &mut ImageBuffer, to: Projection) {
    let (width, height, channels) = (dst.width(), dst.height(), dst.channels());
    debug_assert_eq!(src.channels(), channels, "channel count mismatch");

    dst.par_rows_mut().enumerate().for_each(|(row, line)| {
        for (col, px) in line.chunks_exact_mut(channels).enumerate() {
            let angles = to.uv_to_lat_long(&pixel_center(col, row, width, height));
            copy_pixel(px, from.sample(src, &angles));
        }
    });
}

/// Renders into a cubemap strip one face span at a time. Same pixels as
/// [`render`] with a cubemap target.
pub fn render_cubemap_strip(src: &ImageBuffer, from: Projection, dst: &mut ImageBuffer) {
    let face_size = dst.height();
    let channels = dst.channels();
    debug_assert_eq!(dst.width(), face_size * CubeFace::COUNT, "not a cubemap strip");
    debug_assert_eq!(src.channels(), channels, "channel count mismatch");

    let face_stride = face_size * channels;
    dst.par_rows_mut().enumerate().for_each(|(row, line)| {
        for (face, span) in CubeFace::all().into_iter().zip(line.chunks_exact_mut(face_stride)) {
            for (col, px) in span.chunks_exact_mut(channels).enumerate() {
                copy_pixel(px, from.sample(src, &cube_pixel_lat_long(face, col, row, face_size)));
            }
        }
    });
}

/// Renders one square face image.
pub fn render_face(src: &ImageBuffer, from: Projection, dst: &mut ImageBuffer, face: CubeFace) {
    let face_size = dst.width();
    let channels = dst.channels();
    debug_assert_eq!(dst.height(), face_size, "face must be square");

    for (row, line) in dst.rows_mut().enumerate() {
        for (col, px) in line.chunks_exact_mut(channels).enumerate() {
            copy_pixel(px, from.sample(src, &cube_pixel_lat_long(face, col, row, face_size)));
        }
    }
}

/// Renders six separate face images, one rayon task per face.
/// `faces` must hold exactly six square buffers in [`CubeFace`] order.
pub fn render_cubemap_faces(src: &ImageBuffer, from: Projection, faces: &mut [ImageBuffer]) {
    assert_eq!(faces.len(), CubeFace::COUNT, "a cubemap has six faces");
    faces
        .par_iter_mut()
        .zip(CubeFace::all())
        .for_each(|(dst, face)| render_face(src, from, dst, face));
}

/// Cuts a `6h x h` strip into six `h x h` faces.
pub fn split_strip(strip: &ImageBuffer) -> Result<Vec<ImageBuffer>, ConvertError> {
    let size = strip.height();
    CubeFace::all()
        .iter()
        .map(|face| strip.region(face.index() * size, 0, size, size))
        .collect()
}

/// Lays six equally sized square faces out as one strip.
pub fn join_faces(faces: &[ImageBuffer]) -> Result<ImageBuffer, ConvertError> {
    assert_eq!(faces.len(), CubeFace::COUNT, "a cubemap has six faces");
    let size = faces[0].height();
    let mut strip = ImageBuffer::allocate(size * CubeFace::COUNT, size, faces[0].channels())?;
    for (i, face) in faces.iter().enumerate() {
        strip.blit(face, i * size, 0);
    }
    Ok(strip)
}

/// Allocates the destination for `conversion` and renders `src` into it.
///
/// `src` must already be a sheet in `conversion.from`; six-face inputs are
/// joined into a strip beforehand. Allocation is the only failure.
pub fn convert(src: &ImageBuffer, conversion: &Conversion) -> Result<Rendered, ConvertError> {
    let (width, height) = destination_size(src, conversion.to);
    let channels = src.channels();

    let start = Instant::now();
    let rendered = if conversion.writes_faces() {
        info!("Output image size: 6 x {height}x{height}");
        let mut faces = (0..CubeFace::COUNT)
            .map(|_| ImageBuffer::allocate(height, height, channels))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Rendering...");
        render_cubemap_faces(src, conversion.from, &mut faces);
        Rendered::Faces(faces)
    } else {
        info!("Output image size: {width}x{height}");
        let mut dst = ImageBuffer::allocate(width, height, channels)?;
        info!("Rendering...");
        match conversion.to {
            Projection::Cubemap => render_cubemap_strip(src, conversion.from, &mut dst),
            Projection::LatLong => render(src, conversion.from, &mut dst, conversion.to),
        }
        Rendered::Sheet(dst)
    };
    info!("Rendering finished.");
    debug!("Render time: {:?}", start.elapsed());

    Ok(rendered)
}
