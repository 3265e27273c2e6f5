use log::info;
use std::time::Instant;

use crate::error::ConvertError;
use crate::io::cli::Settings;
use crate::io::image::{load_faces, load_sheet, save, save_faces};
use crate::pipeline::renderer::{Rendered, convert};

/// Load, convert, save. Decode failures stop the run before the destination
/// is allocated; the source buffer is released before encoding starts.
pub fn run_job(settings: &Settings) -> Result<(), ConvertError> {
    let start = Instant::now();
    let conversion = &settings.conversion;
    info!(
        "Converting {} -> {} (cubemap layout: {})",
        conversion.from, conversion.to, conversion.layout
    );

    info!("Loading input image...");
    let src = if conversion.reads_faces() {
        load_faces(&settings.input)?
    } else {
        load_sheet(&settings.input, conversion.from)?
    };

    let rendered = convert(&src, conversion)?;
    drop(src);

    info!("Saving output image...");
    match rendered {
        Rendered::Sheet(img) => save(&img, &settings.output, settings.atomic_write)?,
        Rendered::Faces(faces) => save_faces(&faces, &settings.output, settings.atomic_write)?,
    }

    info!("Total time: {:?}", start.elapsed());
    Ok(())
}
