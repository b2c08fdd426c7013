//! Scale normalisation before synthesis and size restoration after matting
//!
//! The model collaborator expects a fixed input height, so style images are
//! brought to that height with area averaging. The matted result is then
//! brought back to the caller's original dimensions with Lanczos3, which
//! keeps glyph edges sharper than linear or area filters when enlarging.

use crate::error::{Result, StyleTextError};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel, RgbImage, RgbaImage};

/// Width that keeps the aspect ratio at `target_height`, never below 1
#[must_use]
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return width.max(1);
    }
    let scaled = (f64::from(target_height) * f64::from(width) / f64::from(height)).round();
    (scaled as u32).max(1)
}

/// Rescale an image to a fixed height while preserving its aspect ratio
pub struct AspectPreservingResizer;

impl AspectPreservingResizer {
    /// Resize `image` so its height is exactly `target_height`
    ///
    /// An image already at `target_height` is returned as-is. Shrinking uses
    /// area averaging; the rare enlargement falls back to bilinear filtering,
    /// which is what area interpolation degenerates to when upsampling.
    pub fn resize_to_height(image: RgbImage, target_height: u32) -> Result<RgbImage> {
        if target_height == 0 {
            return Err(StyleTextError::config_value_error(
                "target height",
                target_height,
                "1-4096",
                Some(32),
            ));
        }

        let (width, height) = image.dimensions();
        if height == target_height {
            return Ok(image);
        }
        if width == 0 || height == 0 {
            return Err(StyleTextError::decode("image has zero width or height"));
        }

        let target_width = scaled_width(width, height, target_height);
        tracing::trace!(
            width,
            height,
            target_width,
            target_height,
            "Normalising style image height"
        );

        if target_height < height {
            resize_area(&image, target_width, target_height)
        } else {
            Ok(imageops::resize(
                &image,
                target_width,
                target_height,
                FilterType::Triangle,
            ))
        }
    }
}

/// Resize the matted result back to the caller's dimensions
pub struct UpscaleRestorer;

impl UpscaleRestorer {
    /// Resize all four channels to exactly `target_width` x `target_height`
    pub fn restore_size(image: RgbaImage, target_width: u32, target_height: u32) -> Result<RgbaImage> {
        if target_width == 0 || target_height == 0 {
            return Err(StyleTextError::internal(format!(
                "cannot restore to {}x{}",
                target_width, target_height
            )));
        }
        if image.dimensions() == (target_width, target_height) {
            return Ok(image);
        }
        Ok(imageops::resize(
            &image,
            target_width,
            target_height,
            FilterType::Lanczos3,
        ))
    }
}

/// Source coverage of each destination sample along one axis
///
/// Every destination sample spans `src_len / dst_len` source samples; the
/// weights are the overlap fractions and sum to one.
fn area_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f32)>> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    (0..dst_len)
        .map(|i| {
            let start = f64::from(i) * scale;
            let end = (start + scale).min(f64::from(src_len));
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(f64::from(s) + 1.0) - start.max(f64::from(s));
                    (overlap > 0.0).then(|| (s as usize, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

/// Area-averaging resample for shrinking, applied separably
pub(crate) fn resize_area<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    target_width: u32,
    target_height: u32,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let out = area_resample(
        image.as_raw(),
        (width, height),
        usize::from(P::CHANNEL_COUNT),
        (target_width, target_height),
    )?;
    let len = out.len();
    ImageBuffer::from_raw(target_width, target_height, out).ok_or_else(|| {
        StyleTextError::internal(format!(
            "area resize produced {} bytes for {}x{}",
            len, target_width, target_height
        ))
    })
}

fn out_of_bounds(buffer: &str, index: usize) -> StyleTextError {
    StyleTextError::internal(format!("area resize indexed {} buffer out of bounds at {}", buffer, index))
}

/// Interleaved `u8` samples of a `size` image resampled to `target`
fn area_resample(
    src: &[u8],
    size: (u32, u32),
    channels: usize,
    target: (u32, u32),
) -> Result<Vec<u8>> {
    let (width, height) = size;
    let (target_width, target_height) = target;
    let expected = width as usize * height as usize * channels;
    if src.len() != expected {
        return Err(StyleTextError::internal(format!(
            "area resize got {} bytes for a {}x{}x{} image",
            src.len(),
            width,
            height,
            channels
        )));
    }

    let x_weights = area_weights(width, target_width);
    let y_weights = area_weights(height, target_height);

    // Horizontal pass into a float buffer of target_width x height
    let row_len = target_width as usize * channels;
    let mut horizontal = vec![0f32; row_len * height as usize];
    for y in 0..height as usize {
        let src_row = y * width as usize * channels;
        for (ox, weights) in x_weights.iter().enumerate() {
            for &(sx, w) in weights {
                for c in 0..channels {
                    let from = src_row + sx * channels + c;
                    let to = y * row_len + ox * channels + c;
                    let value = *src.get(from).ok_or_else(|| out_of_bounds("source", from))?;
                    let acc = horizontal
                        .get_mut(to)
                        .ok_or_else(|| out_of_bounds("horizontal", to))?;
                    *acc += w * f32::from(value);
                }
            }
        }
    }

    // Vertical pass
    let mut out = Vec::with_capacity(row_len * target_height as usize);
    for weights in &y_weights {
        for i in 0..row_len {
            let mut sum = 0f32;
            for &(sy, w) in weights {
                let index = sy * row_len + i;
                sum += w * *horizontal
                    .get(index)
                    .ok_or_else(|| out_of_bounds("horizontal", index))?;
            }
            out.push(sum.round().clamp(0.0, 255.0) as u8);
        }
    }

    Ok(out)
}
