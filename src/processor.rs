//! Styled text generation processor
//!
//! `StyleTextProcessor` sequences one generation: decode the upload, bring
//! it to the model's input height, synthesise, key out the background,
//! restore the caller's size, persist the audit artifacts and encode the
//! PNG. The synthesizer is injected at construction, so a processor is
//! always fully usable once built.

use crate::{
    config::{PipelineConfig, SynthesizerConfig},
    error::{Result, StyleTextError},
    inference::{Synthesizer, SynthesizerFactory},
    services::{ArtifactPersister, ArtifactSet, ImageCodec, PipelineStage, StageTracker},
    types::{
        validate_text, GenerationOutput, Language, ProcessingTimings, StyleRequest, SynthesisResult,
    },
    utils::{apply_alpha, AspectPreservingResizer, UpscaleRestorer},
};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Runs the generation pipeline around one shared synthesizer
pub struct StyleTextProcessor {
    config: PipelineConfig,
    synthesizer: Arc<dyn Synthesizer>,
    persister: Option<ArtifactPersister>,
}

impl std::fmt::Debug for StyleTextProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleTextProcessor")
            .field("config", &self.config)
            .field("synthesizer", &self.synthesizer.name())
            .finish_non_exhaustive()
    }
}

impl StyleTextProcessor {
    /// Create a processor, validating `config` and creating the output directory
    ///
    /// # Errors
    /// - Invalid pipeline configuration
    /// - Output directory cannot be created
    pub fn new(config: PipelineConfig, synthesizer: Arc<dyn Synthesizer>) -> Result<Self> {
        config.validate()?;

        let persister = if config.persist_artifacts {
            let persister = ArtifactPersister::new(&config.output_dir);
            persister.ensure_output_dir()?;
            Some(persister)
        } else {
            None
        };

        info!(
            synthesizer = synthesizer.name(),
            target_height = config.target_height,
            output_dir = %config.output_dir.display(),
            persist = config.persist_artifacts,
            "Style text processor initialized"
        );

        Ok(Self {
            config,
            synthesizer,
            persister,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn synthesizer_name(&self) -> &str {
        self.synthesizer.name()
    }

    /// Generate a transparent PNG of `text` in the style of `image_bytes`
    ///
    /// Artifact persistence is best-effort: a failed write is logged and
    /// reported in [`GenerationOutput::persistence_error`] but does not fail
    /// the generation.
    ///
    /// # Errors
    /// - [`StyleTextError::InvalidRequest`] for blank text
    /// - [`StyleTextError::Decode`] when the upload is not an image
    /// - [`StyleTextError::Synthesis`] when the model fails or breaks its output contract
    /// - [`StyleTextError::Encode`] / `Internal` for invariant violations
    pub fn generate(
        &self,
        image_bytes: &[u8],
        text: &str,
        language: Language,
    ) -> Result<GenerationOutput> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "generate",
            request_id = %request_id,
            language = %language,
            text_len = text.chars().count(),
            upload_bytes = image_bytes.len()
        );
        let _guard = span.enter();

        let mut tracker = StageTracker::new();
        match self.run(request_id, image_bytes, text, language, &mut tracker) {
            Ok(output) => {
                info!(
                    width = output.width,
                    height = output.height,
                    persisted = output.artifacts_persisted(),
                    timings = %output.timings.summary(),
                    "Generation completed"
                );
                Ok(output)
            },
            Err(e) => {
                tracker.fail(e.kind());
                let stage = tracker
                    .failure()
                    .map_or(PipelineStage::Received, |f| f.stage);
                error!(stage = %stage, kind = %e.kind(), error = %e, "Generation failed");
                Err(e)
            },
        }
    }

    fn run(
        &self,
        request_id: Uuid,
        image_bytes: &[u8],
        text: &str,
        language: Language,
        tracker: &mut StageTracker,
    ) -> Result<GenerationOutput> {
        let mut timings = ProcessingTimings::default();
        let text = validate_text(text)?;

        let style = ImageCodec::decode(image_bytes)?;
        let (original_width, original_height) = style.dimensions();
        timings.decode = tracker.advance(PipelineStage::Decoded)?;

        let normalized = AspectPreservingResizer::resize_to_height(style, self.config.target_height)?;
        debug!(
            original_width,
            original_height,
            width = normalized.width(),
            height = normalized.height(),
            "Style image normalised"
        );
        timings.normalize = tracker.advance(PipelineStage::Normalized)?;

        let request = StyleRequest::new(text, normalized, language)?;
        let synthesis = self.synthesize(&request)?;
        timings.synthesize = tracker.advance(PipelineStage::Synthesized)?;

        let mask = self.config.chroma_key.extract_alpha(&synthesis.fake_text);
        let matted = apply_alpha(&synthesis.fake_text, &mask);
        debug!(coverage = mask.coverage(), "Alpha matte extracted");
        timings.matte = tracker.advance(PipelineStage::Matted)?;

        let restored = UpscaleRestorer::restore_size(matted, original_width, original_height)?;
        timings.restore = tracker.advance(PipelineStage::Restored)?;

        let (artifacts, persistence_error) = match &self.persister {
            Some(persister) => {
                let set = ArtifactSet {
                    text: &restored,
                    fake_sk: &synthesis.fake_sk,
                    fusion: &synthesis.fake_fusion,
                    mask: &mask,
                };
                match persister.persist(&request_id, set) {
                    Ok(paths) => (Some(paths), None),
                    Err(e) => {
                        warn!(error = %e, "Artifact persistence failed, returning image anyway");
                        (None, Some(e.to_string()))
                    },
                }
            },
            None => (None, None),
        };
        timings.persist = tracker.advance(PipelineStage::Persisted)?;

        let png = ImageCodec::encode_png(&DynamicImage::ImageRgba8(restored))?;
        timings.encode = tracker.advance(PipelineStage::Encoded)?;

        tracker.advance(PipelineStage::Done)?;
        timings.total = tracker.total_elapsed();

        Ok(GenerationOutput {
            request_id,
            png,
            width: original_width,
            height: original_height,
            artifacts,
            persistence_error,
            timings,
        })
    }

    /// Call the synthesizer and check its output contract
    fn synthesize(&self, request: &StyleRequest) -> Result<SynthesisResult> {
        let result = self.synthesizer.synthesize(request).map_err(|e| match e {
            StyleTextError::Synthesis(_) => e,
            other => StyleTextError::synthesis_with_backend(
                self.synthesizer.name(),
                "Inference",
                &other.to_string(),
            ),
        })?;
        result.validate()?;
        Ok(result)
    }
}

/// Whether the service can take generation requests
///
/// Built once at startup. A synthesizer that failed to load leaves the
/// service `Unavailable` until restart; requests are refused, never queued.
#[derive(Debug, Clone)]
pub enum ProcessorState {
    Ready(Arc<StyleTextProcessor>),
    Unavailable(String),
}

impl ProcessorState {
    /// Build the synthesizer with `factory` and wrap it in a processor
    ///
    /// The factory is handed the pipeline's chroma key so the synthesizer's
    /// background matches the band being keyed out.
    ///
    /// Synthesizer failures produce `Unavailable`. Pipeline configuration
    /// problems are returned as errors: they are operator mistakes, not a
    /// missing model.
    pub fn initialize<F: SynthesizerFactory>(
        factory: &F,
        synthesizer: &SynthesizerConfig,
        pipeline: PipelineConfig,
    ) -> Result<Self> {
        match factory.create(synthesizer, &pipeline.chroma_key) {
            Ok(synth) => {
                let processor = StyleTextProcessor::new(pipeline, synth)?;
                Ok(Self::Ready(Arc::new(processor)))
            },
            Err(e) => {
                error!(error = %e, kind = %synthesizer.kind, "Synthesizer initialization failed");
                Ok(Self::Unavailable(e.to_string()))
            },
        }
    }

    /// The processor, or `ModelUnavailable`
    pub fn processor(&self) -> Result<Arc<StyleTextProcessor>> {
        match self {
            Self::Ready(processor) => Ok(Arc::clone(processor)),
            Self::Unavailable(reason) => Err(StyleTextError::model_unavailable(reason.clone())),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
