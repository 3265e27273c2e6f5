use image::error::{ParameterError, ParameterErrorKind};
use image::{ExtendedColorType, ImageError, ImageFormat};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::face::CubeFace;
use crate::core::image_buffer::ImageBuffer;
use crate::core::projection::Projection;
use crate::error::ConvertError;
use crate::pipeline::renderer::join_faces;

/// Decodes an image file into an RGB buffer, whatever its native format.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ImageBuffer, ConvertError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| ConvertError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = (img.width() as usize, img.height() as usize);
    debug!("Decoded {:?}: {}x{} {:?}", path, width, height, img.color());

    ImageBuffer::from_rgb(img.into_rgb8()).ok_or_else(|| ConvertError::Layout {
        path: path.to_path_buf(),
        width,
        height,
        expected: "a non-empty image".to_string(),
    })
}

/// Loads a single sheet and checks it fits `projection`.
pub fn load_sheet<P: AsRef<Path>>(path: P, projection: Projection) -> Result<ImageBuffer, ConvertError> {
    let path = path.as_ref();
    let img = load(path)?;
    if !projection.accepts(img.width(), img.height()) {
        return Err(ConvertError::Layout {
            path: path.to_path_buf(),
            width: img.width(),
            height: img.height(),
            expected: match projection {
                Projection::LatLong => "a non-empty latlong sheet".to_string(),
                Projection::Cubemap => "a cubemap strip (width = 6 x height)".to_string(),
            },
        });
    }
    info!("Loaded input image: {:?} ({}x{})", path, img.width(), img.height());
    Ok(img)
}

/// `dir/name.ext` becomes `dir/name_<face>.ext`.
pub fn face_path(path: &Path, face: CubeFace) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{}.{}", face.short_name(), ext.to_string_lossy()),
        None => format!("{stem}_{}", face.short_name()),
    };
    path.with_file_name(name)
}

/// Loads the six `name_<face>.ext` files next to `path` and joins them into
/// a strip. Every face must be square and the same size.
pub fn load_faces<P: AsRef<Path>>(path: P) -> Result<ImageBuffer, ConvertError> {
    let path = path.as_ref();
    let mut faces = Vec::with_capacity(CubeFace::COUNT);
    for face in CubeFace::all() {
        let face_file = face_path(path, face);
        let img = load(&face_file)?;
        let size = faces.first().map_or(img.height(), |f: &ImageBuffer| f.height());
        if img.width() != size || img.height() != size {
            return Err(ConvertError::Layout {
                path: face_file,
                width: img.width(),
                height: img.height(),
                expected: format!("a {size}x{size} cubemap face"),
            });
        }
        faces.push(img);
    }
    let strip = join_faces(&faces)?;
    info!(
        "Loaded input faces: {:?} (6 x {}x{})",
        path,
        strip.height(),
        strip.height()
    );
    Ok(strip)
}

fn encode_error(path: &Path, msg: String) -> ConvertError {
    ConvertError::Encode {
        path: path.to_path_buf(),
        source: ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::Generic(msg))),
    }
}

fn color_type(channels: usize) -> Option<ExtendedColorType> {
    match channels {
        1 => Some(ExtendedColorType::L8),
        2 => Some(ExtendedColorType::La8),
        3 => Some(ExtendedColorType::Rgb8),
        4 => Some(ExtendedColorType::Rgba8),
        _ => None,
    }
}

/// Encodes `img` to `path`; the format follows the file extension.
///
/// With `atomic`, the image is first written to a hidden sibling file and
/// renamed into place, so a failed write never leaves a truncated output.
pub fn save<P: AsRef<Path>>(img: &ImageBuffer, path: P, atomic: bool) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).map_err(|source| ConvertError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let color = color_type(img.channels())
        .ok_or_else(|| encode_error(path, format!("{} channels per pixel", img.channels())))?;
    let (width, height) = match (u32::try_from(img.width()), u32::try_from(img.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(encode_error(
                path,
                format!("{}x{} is too large", img.width(), img.height()),
            ));
        }
    };

    let target = if atomic { temp_sibling(path) } else { path.to_path_buf() };
    let written = image::save_buffer_with_format(&target, img.as_bytes(), width, height, color, format);
    if let Err(source) = written {
        if atomic && fs::remove_file(&target).is_err() {
            warn!("Could not remove temporary file {:?}", target);
        }
        return Err(ConvertError::Encode {
            path: path.to_path_buf(),
            source,
        });
    }

    if atomic {
        fs::rename(&target, path).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    info!("Image saved to {:?}", path);
    Ok(())
}

/// Saves six faces as `name_<face>.ext` next to `path`.
pub fn save_faces<P: AsRef<Path>>(
    faces: &[ImageBuffer],
    path: P,
    atomic: bool,
) -> Result<(), ConvertError> {
    let path = path.as_ref();
    for (face, img) in CubeFace::all().into_iter().zip(faces) {
        save(img, face_path(path, face), atomic)?;
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn gradient(width: usize, height: usize) -> ImageBuffer {
        let mut img = ImageBuffer::allocate(width, height, 3).unwrap();
        for row in 0..height {
            for col in 0..width {
                img.pixel_mut(col, row)
                    .copy_from_slice(&[col as u8, row as u8, (col + row) as u8]);
            }
        }
        img
    }

    #[test]
    fn test_save_and_load_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = gradient(12, 2);

        save(&img, &path, true).unwrap();
        assert!(path.exists());
        assert_eq!(load(&path).unwrap(), img);

        // Only the final file remains
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_load_forces_rgb() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let rgba = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 40]));
        rgba.save(&path).unwrap();

        let img = load(&path).unwrap();
        assert_eq!(img.channels(), 3);
        assert_eq!(img.pixel(2, 1), &[10, 20, 30]);

        let path = dir.path().join("gray.png");
        image::GrayImage::from_pixel(2, 2, image::Luma([77])).save(&path).unwrap();
        assert_eq!(load(&path).unwrap().pixel(0, 0), &[77, 77, 77]);
    }

    #[test]
    fn test_load_missing_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_load_corrupt_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load(&path), Err(ConvertError::Decode { .. })));
    }

    #[test]
    fn test_load_sheet_checks_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.png");
        save(&gradient(10, 4), &path, false).unwrap();

        assert!(load_sheet(&path, Projection::LatLong).is_ok());
        let err = load_sheet(&path, Projection::Cubemap).unwrap_err();
        assert!(matches!(err, ConvertError::Layout { width: 10, height: 4, .. }));
        assert!(err.to_string().contains("cubemap strip (width = 6 x height)"));
    }

    #[test]
    fn test_unknown_extension_is_encode_error() {
        let dir = tempdir().unwrap();
        let err = save(&gradient(2, 2), dir.path().join("out.nothing"), true).unwrap_err();
        assert!(matches!(err, ConvertError::Encode { .. }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_face_path() {
        let p = Path::new("/tmp/pano/sky.png");
        assert_eq!(face_path(p, CubeFace::NegY), Path::new("/tmp/pano/sky_negy.png"));
        assert_eq!(
            face_path(Path::new("sky"), CubeFace::PosX),
            Path::new("sky_posx")
        );
    }

    #[test]
    fn test_faces_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cube.png");
        let strip = gradient(24, 4);
        let faces = crate::pipeline::renderer::split_strip(&strip).unwrap();

        save_faces(&faces, &path, false).unwrap();
        for face in CubeFace::all() {
            assert!(face_path(&path, face).exists(), "{:?}", face);
        }
        assert_eq!(load_faces(&path).unwrap(), strip);
    }

    #[test]
    fn test_load_faces_rejects_mismatched_face() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cube.png");
        let faces = crate::pipeline::renderer::split_strip(&gradient(24, 4)).unwrap();
        save_faces(&faces, &path, false).unwrap();
        save(&gradient(5, 4), face_path(&path, CubeFace::PosZ), false).unwrap();

        let err = load_faces(&path).unwrap_err();
        assert!(matches!(err, ConvertError::Layout { width: 5, .. }));
    }
}
