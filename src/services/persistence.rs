//! Per-request audit artifacts
//!
//! Every successful generation leaves four PNG files in the output directory,
//! named after the request id. Nothing in the service reads them back.

use crate::error::{Result, StyleTextError};
use crate::services::codec::ImageCodec;
use crate::types::{AlphaMask, ArtifactPaths};
use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Borrowed images written for one request
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSet<'a> {
    /// Final transparent image at the caller's size
    pub text: &'a RgbaImage,
    pub fake_sk: &'a DynamicImage,
    pub fusion: &'a RgbImage,
    pub mask: &'a AlphaMask,
}

/// Writes artifact sets into one directory
#[derive(Debug, Clone)]
pub struct ArtifactPersister {
    output_dir: PathBuf,
}

impl ArtifactPersister {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist yet
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            StyleTextError::file_io_error("create output directory", &self.output_dir, &e)
        })
    }

    /// File names for `request_id`
    #[must_use]
    pub fn paths_for(&self, request_id: &Uuid) -> ArtifactPaths {
        let file = |suffix: &str| self.output_dir.join(format!("{}_{}.png", request_id, suffix));
        ArtifactPaths {
            text: file("text"),
            fake_sk: file("fake_sk"),
            fusion: file("fusion"),
            mask: file("mask"),
        }
    }

    /// Write all four artifacts of one request
    ///
    /// A colour skeleton is converted to grayscale first. Stops at the first
    /// failed write; files already written stay on disk.
    pub fn persist(&self, request_id: &Uuid, artifacts: ArtifactSet<'_>) -> Result<ArtifactPaths> {
        let paths = self.paths_for(request_id);

        let skeleton = match artifacts.fake_sk {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => artifacts.fake_sk.clone(),
            other => DynamicImage::ImageLuma8(rec601_gray(other)),
        };

        ImageCodec::save_png(&DynamicImage::ImageRgba8(artifacts.text.clone()), &paths.text)?;
        ImageCodec::save_png(&skeleton, &paths.fake_sk)?;
        ImageCodec::save_png(&DynamicImage::ImageRgb8(artifacts.fusion.clone()), &paths.fusion)?;
        ImageCodec::save_png(
            &DynamicImage::ImageLuma8(artifacts.mask.as_image().clone()),
            &paths.mask,
        )?;

        tracing::debug!(
            request_id = %request_id,
            dir = %self.output_dir.display(),
            "Persisted request artifacts"
        );
        Ok(paths)
    }
}

/// Gray conversion with the Rec.601 weights (0.299, 0.587, 0.114)
///
/// `DynamicImage::to_luma8` uses Rec.709, which makes stored skeletons
/// differ from the ones the generator's tooling writes.
fn rec601_gray(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
