//! Core types for styled text generation

use crate::error::{Result, StyleTextError};
use image::{DynamicImage, GrayImage, RgbImage};
use instant::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Language of the target text, selecting the font used to render it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ch,
    Ko,
}

impl Language {
    /// All supported languages
    pub const ALL: [Language; 3] = [Language::En, Language::Ch, Language::Ko];

    /// Wire tag of this language
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ch => "ch",
            Self::Ko => "ko",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = StyleTextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "en" => Ok(Self::En),
            "ch" => Ok(Self::Ch),
            "ko" => Ok(Self::Ko),
            other => Err(StyleTextError::invalid_request(format!(
                "Unsupported language '{}'. Supported: en, ch, ko",
                other
            ))),
        }
    }
}

/// Immutable input to the model collaborator
#[derive(Debug, Clone)]
pub struct StyleRequest {
    text: String,
    style: RgbImage,
    language: Language,
}

impl StyleRequest {
    /// Create a request, trimming `text` and rejecting it when empty
    pub fn new<S: AsRef<str>>(text: S, style: RgbImage, language: Language) -> Result<Self> {
        let text = validate_text(text.as_ref())?;
        if style.width() == 0 || style.height() == 0 {
            return Err(StyleTextError::invalid_request("style image is empty"));
        }
        Ok(Self {
            text,
            style,
            language,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn style(&self) -> &RgbImage {
        &self.style
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }
}

/// Trim `text`, failing when nothing is left
pub fn validate_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StyleTextError::invalid_request("text must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Output of the model collaborator
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Rendered text in the target style on a flat gray background
    pub fake_text: RgbImage,
    /// Glyph skeleton; may be colour or already single channel
    pub fake_sk: DynamicImage,
    /// Style-fused composite before background removal
    pub fake_fusion: RgbImage,
}

impl SynthesisResult {
    /// Check that all three outputs share the same non-empty dimensions
    pub fn validate(&self) -> Result<()> {
        let text = self.fake_text.dimensions();
        let sk = (self.fake_sk.width(), self.fake_sk.height());
        let fusion = self.fake_fusion.dimensions();

        if text.0 == 0 || text.1 == 0 {
            return Err(StyleTextError::synthesis("fake_text is empty"));
        }
        if sk != text || fusion != text {
            return Err(StyleTextError::synthesis(format!(
                "output dimensions differ: fake_text {}x{}, fake_sk {}x{}, fake_fusion {}x{}",
                text.0, text.1, sk.0, sk.1, fusion.0, fusion.1
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.fake_text.dimensions()
    }
}

/// Binary transparency mask: every sample is 0 or 255
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    image: GrayImage,
}

impl AlphaMask {
    /// Wrap a single-channel image as a mask
    #[must_use]
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    #[must_use]
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.image
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Fraction of opaque samples
    #[must_use]
    pub fn coverage(&self) -> f32 {
        let total = self.image.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        let opaque = self.image.as_raw().iter().filter(|v| **v > 0).count();
        opaque as f32 / total as f32
    }
}

/// Files written for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub text: PathBuf,
    pub fake_sk: PathBuf,
    pub fusion: PathBuf,
    pub mask: PathBuf,
}

impl ArtifactPaths {
    /// Paths in write order
    #[must_use]
    pub fn all(&self) -> [&PathBuf; 4] {
        [&self.text, &self.fake_sk, &self.fusion, &self.mask]
    }
}

/// Per-stage timings of one generation
#[derive(Debug, Clone, Default)]
pub struct ProcessingTimings {
    pub decode: Duration,
    pub normalize: Duration,
    pub synthesize: Duration,
    pub matte: Duration,
    pub restore: Duration,
    pub persist: Duration,
    pub encode: Duration,
    pub total: Duration,
}

impl ProcessingTimings {
    /// Timings as milliseconds, for structured logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "decode={}ms normalize={}ms synthesize={}ms matte={}ms restore={}ms persist={}ms encode={}ms total={}ms",
            self.decode.as_millis(),
            self.normalize.as_millis(),
            self.synthesize.as_millis(),
            self.matte.as_millis(),
            self.restore.as_millis(),
            self.persist.as_millis(),
            self.encode.as_millis(),
            self.total.as_millis()
        )
    }
}

/// Final result of one generation
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub request_id: Uuid,
    /// PNG bytes of the transparent result
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Present when every artifact was written
    pub artifacts: Option<ArtifactPaths>,
    /// Why persistence was skipped or failed, if it was
    pub persistence_error: Option<String>,
    pub timings: ProcessingTimings,
}

impl GenerationOutput {
    #[must_use]
    pub fn artifacts_persisted(&self) -> bool {
        self.artifacts.is_some()
    }
}
