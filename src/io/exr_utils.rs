/* Copyright 2020 @TwoCookingMice */

use crate::core::error::{NeeCacheError, Result};
use crate::math::constants::Float;

use exr::prelude::*;

// Write EXR Image to file
pub fn write_exr_to_file(image: &[(Float, Float, Float)],
                         width: usize,
                         height: usize,
                         file_path: &str) -> Result<()> {
    if image.len() != width * height {
        return Err(NeeCacheError::Exr(format!(
            "image holds {} pixels, expected {}x{}", image.len(), width, height)));
    }
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgb_file(file_path, width, height, |x, y| {
        (
            image[y*width+x].0,
            image[y*width+x].1,
            image[y*width+x].2
        )
    }).map_err(|e| NeeCacheError::Exr(e.to_string()))?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

// Read an RGB EXR image back as rows of pixels
pub fn read_exr_from_file(file_path: &str) -> Result<(Vec<(Float, Float, Float)>, usize, usize)> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read_first_rgba_layer_from_file(
        file_path,
        |resolution, _| {
            let width = resolution.width();
            (vec![(0.0, 0.0, 0.0); width * resolution.height()], width)
        },
        |(pixels, width), position, (r, g, b, _a): (f32, f32, f32, f32)| {
            pixels[position.y() * *width + position.x()] = (r, g, b);
        },
    ).map_err(|e| NeeCacheError::Exr(e.to_string()))?;

    let size = image.layer_data.size;
    let (pixels, _) = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", size.width(), size.height());
    Ok((pixels, size.width(), size.height()))
}
