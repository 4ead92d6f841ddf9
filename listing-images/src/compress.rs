use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};
use std::io::Cursor;

/// Error type for image compression
#[derive(Debug)]
pub enum CompressError {
    Decode(String),
    Encode(String),
    Task(String),
}

impl std::fmt::Display for CompressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressError::Decode(msg) => write!(f, "Image decode error: {}", msg),
            CompressError::Encode(msg) => write!(f, "Image encode error: {}", msg),
            CompressError::Task(msg) => write!(f, "Compression task error: {}", msg),
        }
    }
}

impl std::error::Error for CompressError {}

/// Fits `original` into `max` while keeping the aspect ratio; never upscales
pub fn calculate_resize_dimensions(
    original_width: u32,
    original_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    let ratio =
        (original_width as f32 / max_width as f32).max(original_height as f32 / max_height as f32);

    if ratio > 1.0 {
        let new_width = ((original_width as f32 / ratio) as u32).max(1);
        let new_height = ((original_height as f32 / ratio) as u32).max(1);
        (new_width, new_height)
    } else {
        (original_width, original_height)
    }
}

/// Decodes an image, bounds its dimensions and re-encodes it as JPEG
pub fn compress_image(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<Vec<u8>, CompressError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| CompressError::Decode(format!("Failed to load image: {}", e)))?;

    let (width, height) =
        calculate_resize_dimensions(img.width(), img.height(), max_width, max_height);
    let img = if (width, height) != (img.width(), img.height()) {
        log::debug!(
            "Resizing {}x{} -> {}x{}",
            img.width(),
            img.height(),
            width,
            height
        );
        img.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CompressError::Encode(format!("Failed to write JPEG: {}", e)))?;

    Ok(buffer.into_inner())
}

/// Runs [`compress_image`] on the blocking pool
pub async fn compress_image_blocking(
    bytes: Vec<u8>,
    max_width: u32,
    max_height: u32,
    quality: u8,
) -> Result<Vec<u8>, CompressError> {
    tokio::task::spawn_blocking(move || compress_image(&bytes, max_width, max_height, quality))
        .await
        .map_err(|e| CompressError::Task(format!("Task join error: {}", e)))?
}
