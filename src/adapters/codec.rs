//! Decodificación de subidas y codificación JPEG de resultados.

use image::{codecs::jpeg::JpegEncoder, RgbImage};

use crate::domain::errors::{DomainError, DomainResult};

pub const JPEG_QUALITY: u8 = 90;

/// Decodifica bytes subidos (cualquier formato soportado por `image`) y los convierte a RGB.
pub fn decode_rgb(bytes: &[u8], max_bytes: usize) -> DomainResult<RgbImage> {
    if bytes.len() > max_bytes {
        return Err(DomainError::TooLarge(max_bytes));
    }
    if bytes.is_empty() {
        return Err(DomainError::Decode("image data is empty".into()));
    }

    let img = image::load_from_memory(bytes).map_err(|e| DomainError::Decode(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DomainError::Decode("image has no pixels".into()));
    }
    Ok(img.to_rgb8())
}

pub fn encode_jpeg(image: &RgbImage) -> DomainResult<Vec<u8>> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| DomainError::Inference(format!("jpeg encoding: {e}")))?;
    Ok(jpeg)
}
