//! In-memory image decoding and PNG encoding
//!
//! Uploads arrive as raw bytes with no trustworthy file name, so the format
//! is always sniffed from content.

use crate::error::{Result, StyleTextError};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Service for turning uploaded bytes into pixels and pixels into PNG bytes
pub struct ImageCodec;

impl ImageCodec {
    /// Decode an encoded image into a 3-channel colour image
    ///
    /// Any alpha channel in the upload is dropped.
    ///
    /// # Examples
    /// ```rust
    /// use styletext_api::services::ImageCodec;
    ///
    /// assert!(ImageCodec::decode(b"definitely not an image").is_err());
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
        if bytes.is_empty() {
            return Err(StyleTextError::decode("empty image payload"));
        }

        let format = image::guess_format(bytes).map_err(|e| {
            StyleTextError::decode(format!("unrecognised image format: {}", e))
        })?;

        let image = image::load_from_memory_with_format(bytes, format).map_err(|e| {
            StyleTextError::decode(format!(
                "failed to decode {:?} image ({} bytes): {}",
                format,
                bytes.len(),
                e
            ))
        })?;

        if image.width() == 0 || image.height() == 0 {
            return Err(StyleTextError::decode("image has zero width or height"));
        }

        tracing::trace!(
            ?format,
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded upload"
        );

        Ok(image.to_rgb8())
    }

    /// Encode an image as PNG, keeping its channel layout
    pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| StyleTextError::encode(format!("PNG encoding failed: {}", e)))?;
        Ok(buffer.into_inner())
    }

    /// Save an image as PNG at `path`
    ///
    /// Does not create parent directories.
    pub fn save_png<P: AsRef<std::path::Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        image
            .save_with_format(path_ref, ImageFormat::Png)
            .map_err(|e| StyleTextError::artifact_write_error(path_ref, &e))
    }
}
