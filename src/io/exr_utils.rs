/* Copyright 2020 @TwoCookingMice */

use crate::math::bitmap::Bitmap;
use crate::math::constants::Vector3f;

use exr::prelude::*;

/// Writes the film as a 32-bit float RGB OpenEXR image.
pub fn write_exr_to_file(bitmap: &Bitmap, file_path: &str) -> exr::error::Result<()> {
    log::info!("Starting writing openexr images: {}.", file_path);

    let width = bitmap.width();
    let pixels = bitmap.pixels();
    write_rgb_file(file_path, width, bitmap.height(), |x, y| {
        let p = pixels[y * width + x];
        (p.x, p.y, p.z)
    })?;
    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

/// Reads the first RGB(A) layer of an OpenEXR image; alpha is dropped.
pub fn read_exr_from_file(file_path: &str) -> exr::error::Result<Bitmap> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read_first_rgba_layer_from_file(
        file_path,
        |resolution, _| Bitmap::new(resolution.width(), resolution.height()),
        |bitmap: &mut Bitmap, position, (r, g, b, _a): (f32, f32, f32, f32)| {
            bitmap[(position.x(), position.y())] = Vector3f::new(r, g, b);
        },
    )?;

    let bitmap = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", bitmap.width(), bitmap.height());
    Ok(bitmap)
}
