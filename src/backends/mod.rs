//! Synthesizer implementations
//!
//! - Tract synthesizer (StyleText ONNX export, pure Rust inference)
//! - Glyph synthesizer (font rasteriser, no model)

#[cfg(feature = "tract")]
pub mod tract;

pub mod glyph;

// Test utilities for synthesizer testing
#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "tract")]
pub use self::tract::TractSynthesizer;

pub use self::glyph::GlyphSynthesizer;
