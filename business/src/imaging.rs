//! Image decode and JPEG encode on top of the `image` crate.

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

/// JPEG quality used for registration photos (0.8 on a 0..1 scale).
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, Error)]
pub enum ImagingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

/// Decode any supported format from raw bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
    image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))
}

/// Re-encode as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(out)
}

/// A decoded avatar ready for display.
///
/// Pixels are RGBA, row-major, `width * height * 4` bytes. Clones share the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Avatar {
    pub width: u32,
    pub height: u32,
    pub bytes: Arc<[u8]>,
}

impl Avatar {
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            bytes: Arc::from(rgba.into_raw()),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ImagingError> {
        decode(bytes).map(|image| Self::from_image(&image))
    }
}

impl fmt::Debug for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Avatar")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
