//! Model collaborator abstraction and factory

use crate::config::{SynthesizerConfig, SynthesizerKind};
use crate::error::{Result, StyleTextError};
use crate::types::{StyleRequest, SynthesisResult};
use crate::utils::matte::ChromaKey;
use std::sync::Arc;

/// Renders text in the style of a reference image
///
/// Implementations are shared by all in-flight requests, so any internal
/// serialisation is their own responsibility.
pub trait Synthesizer: Send + Sync {
    /// Short identifier used in logs and the service metadata
    fn name(&self) -> &str;

    /// Produce the three outputs for one request
    ///
    /// The style image of `request` has already been normalised to the
    /// model's input height.
    ///
    /// # Errors
    /// - Model inference failures
    /// - Outputs that cannot be converted back to images
    fn synthesize(&self, request: &StyleRequest) -> Result<SynthesisResult>;
}

/// Constructs a synthesizer from configuration at startup
pub trait SynthesizerFactory {
    /// Build the synthesizer selected by `config.kind`
    ///
    /// `chroma_key` is the band the pipeline will key out. Synthesizers that
    /// paint their own background must paint it inside this band.
    ///
    /// # Errors
    /// - [`StyleTextError::ModelUnavailable`] when the model or fonts cannot be loaded
    fn create(
        &self,
        config: &SynthesizerConfig,
        chroma_key: &ChromaKey,
    ) -> Result<Arc<dyn Synthesizer>>;

    /// Kinds this factory can build in the current build
    fn available_kinds(&self) -> Vec<SynthesizerKind>;
}

/// Factory for the synthesizers compiled into this crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSynthesizerFactory;

impl SynthesizerFactory for DefaultSynthesizerFactory {
    fn create(
        &self,
        config: &SynthesizerConfig,
        chroma_key: &ChromaKey,
    ) -> Result<Arc<dyn Synthesizer>> {
        config
            .validate()
            .map_err(|e| StyleTextError::model_unavailable(e.to_string()))?;

        match config.kind {
            #[cfg(feature = "tract")]
            SynthesizerKind::Tract => {
                let synthesizer = crate::backends::TractSynthesizer::from_config(config)?;
                Ok(Arc::new(synthesizer))
            },
            #[cfg(not(feature = "tract"))]
            SynthesizerKind::Tract => Err(StyleTextError::model_unavailable(
                "the tract synthesizer is not compiled in (enable the 'tract' feature)",
            )),
            SynthesizerKind::Glyph => {
                let synthesizer = crate::backends::GlyphSynthesizer::from_config(config, *chroma_key)?;
                Ok(Arc::new(synthesizer))
            },
        }
    }

    fn available_kinds(&self) -> Vec<SynthesizerKind> {
        let mut kinds = Vec::new();
        #[cfg(feature = "tract")]
        kinds.push(SynthesizerKind::Tract);
        kinds.push(SynthesizerKind::Glyph);
        kinds
    }
}

/// Build the configured synthesizer with [`DefaultSynthesizerFactory`]
pub fn build_synthesizer(
    config: &SynthesizerConfig,
    chroma_key: &ChromaKey,
) -> Result<Arc<dyn Synthesizer>> {
    DefaultSynthesizerFactory.create(config, chroma_key)
}
