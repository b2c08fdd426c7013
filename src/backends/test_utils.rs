//! Test utilities and mock synthesizers
//!
//! Provides a [`Synthesizer`] that needs neither a model file nor fonts.

use crate::{
    error::{Result, StyleTextError},
    inference::Synthesizer,
    types::{StyleRequest, SynthesisResult},
};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::{Arc, Mutex};

/// Width of the flat gray frame in mock output
pub const MOCK_BORDER: u32 = 8;

/// Mock synthesizer for testing
///
/// `fake_text` is a 128 gray frame of [`MOCK_BORDER`] pixels around a
/// coloured interior that never falls inside the default key band.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    /// Texts seen, for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Whether to simulate inference failure
    should_fail: bool,
    /// Shrink `fake_fusion` by one pixel to break the output contract
    mismatched_outputs: bool,
}

impl MockSynthesizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            call_history: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
            mismatched_outputs: false,
        }
    }

    /// Create a mock that fails every call
    #[must_use]
    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// Create a mock whose outputs disagree on dimensions
    #[must_use]
    pub fn new_mismatched() -> Self {
        Self {
            mismatched_outputs: true,
            ..Self::new()
        }
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    fn record_call(&self, text: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(text.to_string());
        }
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Framed image in the shape the generator emits
#[must_use]
pub fn framed_text(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let border = x < MOCK_BORDER
            || y < MOCK_BORDER
            || x + MOCK_BORDER >= width
            || y + MOCK_BORDER >= height;
        if border {
            Rgb([128, 128, 128])
        } else {
            Rgb([200, (x * 3 % 100) as u8, (y * 5 % 100) as u8])
        }
    })
}

impl Synthesizer for MockSynthesizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn synthesize(&self, request: &StyleRequest) -> Result<SynthesisResult> {
        self.record_call(request.text());
        if self.should_fail {
            return Err(StyleTextError::synthesis_with_backend(
                "mock",
                "Inference",
                "simulated failure",
            ));
        }

        let (width, height) = request.style().dimensions();
        let fake_text = framed_text(width, height);
        let fusion_width = if self.mismatched_outputs {
            width.saturating_sub(1).max(1)
        } else {
            width
        };

        Ok(SynthesisResult {
            fake_sk: DynamicImage::ImageRgb8(fake_text.clone()),
            fake_fusion: RgbImage::from_pixel(fusion_width, height, Rgb([90, 90, 90])),
            fake_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use crate::utils::matte::ChromaKey;

    #[test]
    fn test_mock_output_shape() {
        let mock = MockSynthesizer::new();
        let request = StyleRequest::new("abc", RgbImage::new(64, 32), Language::Ko).unwrap();
        let result = mock.synthesize(&request).unwrap();
        assert!(result.validate().is_ok());
        assert_eq!(mock.get_call_history(), vec!["abc".to_string()]);
    }

    #[test]
    fn test_mock_frame_is_keyed_out() {
        let key = ChromaKey::default();
        let text = framed_text(64, 32);
        assert!(key.is_background(text.get_pixel(0, 0)));
        assert!(key.is_background(text.get_pixel(63, 31)));
        assert!(!key.is_background(text.get_pixel(MOCK_BORDER, MOCK_BORDER)));
    }

    #[test]
    fn test_failing_and_mismatched_mocks() {
        let request = StyleRequest::new("abc", RgbImage::new(64, 32), Language::En).unwrap();
        assert!(MockSynthesizer::new_failing().synthesize(&request).is_err());

        let result = MockSynthesizer::new_mismatched().synthesize(&request).unwrap();
        assert!(result.validate().is_err());
    }
}
