//! Model-free glyph synthesizer
//!
//! Rasterises the text with the configured font and colours it from the
//! style image. It produces the same three outputs as the generator, with
//! `fake_text` on a flat fill at the centre of the pipeline's chroma-key
//! band (128 gray by default), so the whole pipeline runs end-to-end
//! without an ONNX export.

use crate::config::SynthesizerConfig;
use crate::error::Result;
use crate::inference::Synthesizer;
use crate::types::{StyleRequest, SynthesisResult};
use crate::utils::matte::ChromaKey;
use crate::utils::text::{blend, FontSet};
use image::{DynamicImage, Rgb, RgbImage};

/// Coverage above which a pixel counts as glyph
const COVERAGE_THRESHOLD: u8 = 128;

/// Minimum per-channel distance from the background for a pixel to vote on
/// the text colour
const FOREGROUND_DISTANCE: u32 = 60;

/// Renders text in a colour sampled from the style image
#[derive(Debug)]
pub struct GlyphSynthesizer {
    fonts: FontSet,
    chroma_key: ChromaKey,
}

impl GlyphSynthesizer {
    /// Load the configured fonts; the background is painted inside `chroma_key`
    pub fn from_config(config: &SynthesizerConfig, chroma_key: ChromaKey) -> Result<Self> {
        let fonts = FontSet::load(&config.fonts)?;
        tracing::info!(background = ?chroma_key.centre(), "🖋️ Glyph synthesizer ready");
        Ok(Self::new(fonts, chroma_key))
    }

    #[must_use]
    pub fn new(fonts: FontSet, chroma_key: ChromaKey) -> Self {
        Self { fonts, chroma_key }
    }
}

impl Synthesizer for GlyphSynthesizer {
    fn name(&self) -> &str {
        "glyph"
    }

    fn synthesize(&self, request: &StyleRequest) -> Result<SynthesisResult> {
        let style = request.style();
        let (width, height) = style.dimensions();
        let colour = text_colour(style, &self.chroma_key);

        let mask = self
            .fonts
            .render_mask(request.text(), request.language(), width, height)?;

        let background = self.chroma_key.centre();
        let fake_text = RgbImage::from_fn(width, height, |x, y| {
            if mask.get_pixel(x, y)[0] >= COVERAGE_THRESHOLD {
                colour
            } else {
                background
            }
        });
        let fake_fusion = RgbImage::from_fn(width, height, |x, y| {
            let coverage = f32::from(mask.get_pixel(x, y)[0]) / 255.0;
            blend(*style.get_pixel(x, y), colour, coverage)
        });

        tracing::trace!(?colour, width, height, "Glyph synthesis");

        Ok(SynthesisResult {
            fake_text,
            fake_sk: DynamicImage::ImageLuma8(mask),
            fake_fusion,
        })
    }
}

/// Mean colour of the image border, taken as the style background
#[must_use]
pub fn border_colour(image: &RgbImage) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let border = image
        .enumerate_pixels()
        .filter(|(x, y, _)| *x == 0 || *y == 0 || *x + 1 == width || *y + 1 == height)
        .map(|(_, _, p)| *p);
    mean_colour(border).unwrap_or(Rgb([255, 255, 255]))
}

/// Colour for the rendered text
///
/// The mean of pixels that differ clearly from the border colour, or the
/// border colour's complement if there are none. The result is pushed out
/// of `key`'s band so it survives matting.
#[must_use]
pub fn text_colour(style: &RgbImage, key: &ChromaKey) -> Rgb<u8> {
    let background = border_colour(style);
    let distance = |p: &Rgb<u8>| {
        p.0.iter()
            .zip(background.0.iter())
            .map(|(a, b)| u32::from(a.abs_diff(*b)))
            .max()
            .unwrap_or(0)
    };

    let colour = mean_colour(style.pixels().filter(|p| distance(p) >= FOREGROUND_DISTANCE).copied())
        .unwrap_or_else(|| Rgb(background.0.map(|c| 255 - c)));

    key.push_outside(colour)
}

fn mean_colour<I: Iterator<Item = Rgb<u8>>>(pixels: I) -> Option<Rgb<u8>> {
    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for pixel in pixels {
        for (sum, value) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += u64::from(*value);
        }
        count += 1;
    }
    (count > 0).then(|| Rgb(sums.map(|s| ((s + count / 2) / count) as u8)))
}
