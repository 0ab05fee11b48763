//! Decoding and encoding at the pipeline boundary.
//!
//! The pipeline itself only ever sees RGBA and single-channel buffers;
//! everything container-format related lives here.

use crate::error::PrepError;
use image::{GrayImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Decode raw request bytes into an RGBA buffer.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PrepError> {
    let image = image::load_from_memory(bytes).map_err(|e| PrepError::Decode(e.to_string()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    rgba_from_raw(width, height, rgba.into_raw())
}

/// Build an RGBA image from a caller-supplied raw buffer, validating the
/// dimensions and the buffer length.
pub fn rgba_from_raw(width: u32, height: u32, buf: Vec<u8>) -> Result<RgbaImage, PrepError> {
    if width == 0 || height == 0 {
        return Err(PrepError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    let actual = buf.len();
    RgbaImage::from_raw(width, height, buf)
        .ok_or(PrepError::BufferSize { expected, actual })
}

/// Encode the final binary image as PNG.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, PrepError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| PrepError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
