use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage};
use std::fs;
use std::io::{self, BufWriter};
use std::path::Path;

/// Decode downloaded bytes and reject images that are obviously broken
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "Empty image body",
        )));
    }

    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "Image has invalid dimensions (0x0)",
        )));
    }

    Ok(img)
}

/// Scale `img` so both sides are at least `target`, then cut the centered
/// `target` x `target` square.
pub fn square_crop(img: &DynamicImage, target: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 || target == 0 {
        return RgbImage::new(target, target);
    }

    let (new_width, new_height) = cover_dimensions(width, height, target);
    let resized = imageops::resize(&img.to_rgb8(), new_width, new_height, FilterType::Lanczos3);

    let x = (new_width - target) / 2;
    let y = (new_height - target) / 2;
    imageops::crop_imm(&resized, x, y, target, target).to_image()
}

/// Size after uniform scaling by `max(target/w, target/h)`; never below `target`
pub fn cover_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = f64::max(
        target as f64 / width as f64,
        target as f64 / height as f64,
    );
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(target);
    (scaled(width), scaled(height))
}

/// Encode as JPEG at the given quality
pub fn save_jpeg(img: &RgbImage, path: &Path, quality: u8) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    img.write_with_encoder(encoder)?;
    Ok(())
}
