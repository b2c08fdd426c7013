//! Chroma-key matting of synthesised text
//!
//! The model paints rendered text over a flat gray fill. Pixels whose three
//! channels all fall inside the key band are background (alpha 0), every
//! other pixel is foreground (alpha 255). There is no partial alpha and no
//! spatial smoothing.

use crate::error::{Result, StyleTextError};
use crate::types::AlphaMask;
use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Inclusive per-channel background band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChromaKey {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for ChromaKey {
    /// Band centred on the flat 128 gray the StyleText generator emits
    fn default() -> Self {
        Self {
            lower: [120, 120, 120],
            upper: [135, 135, 135],
        }
    }
}

impl ChromaKey {
    #[must_use]
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Check that every lower bound is at most its upper bound
    pub fn validate(&self) -> Result<()> {
        let ordered = self
            .lower
            .iter()
            .zip(self.upper.iter())
            .all(|(lo, hi)| lo <= hi);
        if ordered {
            Ok(())
        } else {
            Err(StyleTextError::invalid_config(format!(
                "Chroma key lower bound {:?} exceeds upper bound {:?}",
                self.lower, self.upper
            )))
        }
    }

    /// Whether a pixel falls inside the background band on all channels
    #[must_use]
    pub fn is_background(&self, pixel: &Rgb<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (lo, hi))| (*lo..=*hi).contains(value))
    }

    /// Middle of the band, rounded up: the fill a synthesizer should paint
    #[must_use]
    pub fn centre(&self) -> Rgb<u8> {
        let mid = |c: usize| ((u16::from(self.lower[c]) + u16::from(self.upper[c]) + 1) / 2) as u8;
        Rgb([mid(0), mid(1), mid(2)])
    }

    /// Move `colour` just outside the band with the smallest single-channel change
    ///
    /// Colours already outside are returned as is. A band spanning the
    /// whole range on every channel has no outside; the colour is returned
    /// unchanged.
    #[must_use]
    pub fn push_outside(&self, colour: Rgb<u8>) -> Rgb<u8> {
        if !self.is_background(&colour) {
            return colour;
        }

        let mut best: Option<(usize, u8, u8)> = None;
        for c in 0..3 {
            let value = colour[c];
            let below = self.lower[c].checked_sub(1);
            let above = self.upper[c].checked_add(1);
            for candidate in [below, above].into_iter().flatten() {
                let change = value.abs_diff(candidate);
                if best.map_or(true, |(_, _, d)| change < d) {
                    best = Some((c, candidate, change));
                }
            }
        }

        match best {
            Some((channel, value, _)) => {
                let mut moved = colour;
                moved[channel] = value;
                moved
            },
            None => colour,
        }
    }

    /// Derive the binary alpha mask of a flat-background image
    #[must_use]
    pub fn extract_alpha(&self, fake_text: &RgbImage) -> AlphaMask {
        let (width, height) = fake_text.dimensions();
        let mask = GrayImage::from_fn(width, height, |x, y| {
            if self.is_background(fake_text.get_pixel(x, y)) {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        AlphaMask::new(mask)
    }
}

/// Attach `mask` as the fourth channel of `color`
///
/// Colour samples are copied unchanged; only alpha is inserted.
///
/// # Panics
///
/// Panics when `color` and `mask` differ in width or height. Both come out of
/// the same synthesis result, so a mismatch is a programming error.
#[must_use]
pub fn apply_alpha(color: &RgbImage, mask: &AlphaMask) -> RgbaImage {
    assert_eq!(
        color.dimensions(),
        mask.dimensions(),
        "alpha mask must match the colour image dimensions"
    );

    let alpha = mask.as_image();
    let (width, height) = color.dimensions();
    let mut result = RgbaImage::new(width, height);

    for (x, y, pixel) in color.enumerate_pixels() {
        let a = alpha.get_pixel(x, y)[0];
        result.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], a]));
    }

    result
}
