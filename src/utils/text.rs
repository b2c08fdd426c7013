//! Rasterising the target text
//!
//! Both synthesizers need the text as pixels: the ONNX model takes a plain
//! rendering as its `i_t` input and the glyph synthesizer paints its output
//! from the same coverage mask. Lines are drawn at the style image's height
//! and then squeezed or stretched horizontally to its width.

use crate::config::FontConfig;
use crate::error::{Result, StyleTextError};
use crate::types::Language;
use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::collections::HashMap;
use std::path::Path;

/// Glyph height as a share of the line height
const GLYPH_SCALE: f32 = 0.8;

/// One font per supported language
pub struct FontSet {
    fonts: HashMap<Language, FontVec>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<_> = self.fonts.keys().map(Language::as_str).collect();
        languages.sort_unstable();
        f.debug_struct("FontSet").field("languages", &languages).finish()
    }
}

impl FontSet {
    /// Load the font of every language
    ///
    /// A missing or unparsable font leaves the synthesizer unusable, so
    /// failures are reported as [`StyleTextError::ModelUnavailable`].
    pub fn load(config: &FontConfig) -> Result<Self> {
        let mut fonts = HashMap::new();
        for (language, path) in [
            (Language::En, &config.en),
            (Language::Ch, &config.ch),
            (Language::Ko, &config.ko),
        ] {
            fonts.insert(language, load_font(path)?);
        }
        tracing::debug!(count = fonts.len(), "Loaded text fonts");
        Ok(Self { fonts })
    }

    /// Use the same font for every language
    pub fn single<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut fonts = HashMap::new();
        for language in Language::ALL {
            fonts.insert(language, load_font(path)?);
        }
        Ok(Self { fonts })
    }

    fn font(&self, language: Language) -> Result<&FontVec> {
        self.fonts.get(&language).ok_or_else(|| {
            StyleTextError::synthesis(format!("no font loaded for language '{}'", language))
        })
    }

    /// Glyph coverage of `text` as a `width` x `height` mask
    ///
    /// Covered pixels are bright, empty pixels are 0.
    pub fn render_mask(
        &self,
        text: &str,
        language: Language,
        width: u32,
        height: u32,
    ) -> Result<GrayImage> {
        if width == 0 || height == 0 {
            return Err(StyleTextError::synthesis(format!(
                "cannot render text into {}x{}",
                width, height
            )));
        }

        let font = self.font(language)?;
        let scale = PxScale::from((height as f32 * GLYPH_SCALE).max(1.0));
        let (text_width, text_height) = text_size(scale, font, text);

        let margin = height / 8;
        let line_width = text_width.max(1) + 2 * margin;
        let mut line = GrayImage::new(line_width, height);
        let y = (i64::from(height) - i64::from(text_height)) / 2;
        draw_text_mut(
            &mut line,
            Luma([255]),
            margin as i32,
            y as i32,
            scale,
            font,
            text,
        );

        if line.dimensions() == (width, height) {
            return Ok(line);
        }
        Ok(imageops::resize(&line, width, height, FilterType::Triangle))
    }

    /// `text` in `foreground` on a flat `background`, sized `width` x `height`
    pub fn render_line(
        &self,
        text: &str,
        language: Language,
        width: u32,
        height: u32,
        foreground: Rgb<u8>,
        background: Rgb<u8>,
    ) -> Result<RgbImage> {
        let mask = self.render_mask(text, language, width, height)?;
        Ok(RgbImage::from_fn(width, height, |x, y| {
            let coverage = f32::from(mask.get_pixel(x, y)[0]) / 255.0;
            blend(background, foreground, coverage)
        }))
    }
}

/// Linear mix of two colours, `t` = 0 gives `from`, `t` = 1 gives `to`
#[must_use]
pub fn blend(from: Rgb<u8>, to: Rgb<u8>, t: f32) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    Rgb([mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2])])
}

fn load_font(path: &Path) -> Result<FontVec> {
    let data = std::fs::read(path).map_err(|e| {
        StyleTextError::model_unavailable(format!("failed to read font '{}': {}", path.display(), e))
    })?;
    FontVec::try_from_vec(data).map_err(|e| {
        StyleTextError::model_unavailable(format!("invalid font '{}': {}", path.display(), e))
    })
}

/// DejaVu Sans shipped under `tests/fixtures` for rendering tests
#[cfg(test)]
pub(crate) fn test_font_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}
