//! Shared fixtures for integration tests

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use std::sync::{Arc, Mutex};
use styletext_api::{
    ImageCodec, PipelineConfig, StyleRequest, StyleTextError, StyleTextProcessor, SynthesisResult,
    Synthesizer,
};

/// Width of the flat gray frame drawn by [`FramedSynthesizer`]
pub const FRAME: u32 = 8;

/// What a [`FramedSynthesizer`] saw on each call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub text: String,
    pub style_size: (u32, u32),
    pub language: String,
}

/// Synthesizer that answers like the generator: gray frame, coloured interior
#[derive(Debug, Clone, Default)]
pub struct FramedSynthesizer {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    fail: bool,
}

impl FramedSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn framed(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if x < FRAME || y < FRAME || x + FRAME >= width || y + FRAME >= height {
            Rgb([128, 128, 128])
        } else {
            Rgb([200, ((x * 7) % 90) as u8, ((y * 11) % 90) as u8])
        }
    })
}

impl Synthesizer for FramedSynthesizer {
    fn name(&self) -> &str {
        "framed"
    }

    fn synthesize(&self, request: &StyleRequest) -> styletext_api::Result<SynthesisResult> {
        self.calls.lock().unwrap().push(RecordedCall {
            text: request.text().to_string(),
            style_size: request.style().dimensions(),
            language: request.language().to_string(),
        });
        if self.fail {
            return Err(StyleTextError::synthesis("generator exploded"));
        }

        let (width, height) = request.style().dimensions();
        let fake_text = framed(width, height);
        let skeleton = GrayImage::from_fn(width, height, |x, _| Luma([if x % 2 == 0 { 255 } else { 0 }]));
        Ok(SynthesisResult {
            fake_sk: DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(skeleton).to_rgb8()),
            fake_fusion: request.style().clone(),
            fake_text,
        })
    }
}

/// Encoded style image with a gradient, so nothing is accidentally flat
pub fn style_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 40])
    });
    let mut buffer = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn style_png(width: u32, height: u32) -> Vec<u8> {
    let bytes = style_image(width, height, ImageFormat::Png);
    assert!(ImageCodec::decode(&bytes).is_ok());
    bytes
}

pub fn processor(dir: &std::path::Path, synthesizer: FramedSynthesizer) -> StyleTextProcessor {
    let config = PipelineConfig::builder().output_dir(dir).build().unwrap();
    StyleTextProcessor::new(config, Arc::new(synthesizer)).unwrap()
}

/// DejaVu Sans bundled for rendering tests
pub fn test_font_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}

pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
