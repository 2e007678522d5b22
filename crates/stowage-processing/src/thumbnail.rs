//! Thumbnail derivation.
//!
//! Input bytes are decoded with format guessing, scaled into a square
//! bounding box preserving aspect ratio (never upscaled), and re-encoded as
//! lossless WebP. Output is a pure function of the input bytes and this
//! crate's version, so repeated derivation is byte-identical.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};

use stowage_core::AppError;

pub const THUMBNAIL_CONTENT_TYPE: &str = "image/webp";

/// A derived thumbnail ready to be stored as a sibling object.
#[derive(Debug, Clone)]
pub struct DerivedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub content_type: &'static str,
}

/// Thumbnail deriver with a fixed square bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Thumbnailer {
    max_pixels: u32,
}

impl Thumbnailer {
    pub fn new(max_pixels: u32) -> Self {
        Self { max_pixels }
    }

    pub fn derive(&self, data: &[u8]) -> Result<DerivedImage, AppError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::ThumbnailFailed(format!("Failed to read image: {}", e)))?;

        if reader.format().is_none() {
            return Err(AppError::ThumbnailFailed(
                "Unsupported or unrecognized image format".to_string(),
            ));
        }

        let img = reader
            .decode()
            .map_err(|e| AppError::ThumbnailFailed(format!("Corrupt image: {}", e)))?;

        let (orig_width, orig_height) = img.dimensions();
        let scaled = if orig_width <= self.max_pixels && orig_height <= self.max_pixels {
            // Already inside the bounding box; never upscale.
            img
        } else {
            img.thumbnail(self.max_pixels, self.max_pixels)
        };

        let (width, height) = scaled.dimensions();

        // Lossless WebP encoding only accepts 8-bit RGB/RGBA.
        let rgba = DynamicImage::ImageRgba8(scaled.to_rgba8());
        let mut buffer = Vec::new();
        rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))
            .map_err(|e| AppError::ThumbnailFailed(format!("WebP encoding failed: {}", e)))?;

        tracing::debug!(
            original_width = orig_width,
            original_height = orig_height,
            width,
            height,
            size_bytes = buffer.len(),
            "Thumbnail derived"
        );

        Ok(DerivedImage {
            bytes: Bytes::from(buffer),
            width,
            height,
            content_type: THUMBNAIL_CONTENT_TYPE,
        })
    }
}
