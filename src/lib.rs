#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # StyleText API
//!
//! Renders a text string in the visual style of a reference image and
//! returns it as a transparent PNG.
//!
//! The model collaborator produces the styled text on a flat gray
//! background. This crate wraps that single inference call in a
//! deterministic pipeline:
//!
//! 1. Decode the uploaded bytes (format sniffed from content)
//! 2. Resize the style image to the model's input height, keeping aspect ratio
//! 3. Synthesise `fake_text`, `fake_sk` and `fake_fusion`
//! 4. Key out the gray background into a binary alpha channel
//! 5. Resize the RGBA result back to the upload's size with Lanczos3
//! 6. Write `{id}_text.png`, `{id}_fake_sk.png`, `{id}_fusion.png` and `{id}_mask.png`
//! 7. Encode the PNG returned to the caller
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use styletext_api::{
//!     build_synthesizer, Language, PipelineConfig, StyleTextProcessor, SynthesizerConfig,
//!     SynthesizerKind,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let pipeline = PipelineConfig::default();
//! let synthesizer = build_synthesizer(
//!     &SynthesizerConfig {
//!         kind: SynthesizerKind::Tract,
//!         model_path: Some("models/style_text.onnx".into()),
//!         ..SynthesizerConfig::default()
//!     },
//!     &pipeline.chroma_key,
//! )?;
//! let processor = StyleTextProcessor::new(pipeline, synthesizer)?;
//!
//! let style = std::fs::read("style.png")?;
//! let output = processor.generate(&style, "Hello", Language::En)?;
//! std::fs::write("hello.png", &output.png)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): StyleText ONNX synthesizer on Tract (pure Rust)
//! - `server` (default): axum HTTP server, CLI and tracing subscriber setup
//! - `tracing-json`: JSON log output
//! - `webp-support`: WebP uploads

pub mod backends;
#[cfg(feature = "server")]
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod processor;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
#[cfg(feature = "server")]
pub mod tracing_config;
pub mod types;
pub mod utils;

pub use config::{
    FontConfig, LogFormat, LoggingConfig, PipelineConfig, ServerConfig, ServiceConfig,
    SynthesizerConfig, SynthesizerKind,
};
pub use error::{ErrorKind, Result, StyleTextError};
pub use inference::{build_synthesizer, DefaultSynthesizerFactory, Synthesizer, SynthesizerFactory};
pub use processor::{ProcessorState, StyleTextProcessor};
pub use services::{ArtifactPersister, ImageCodec, PipelineStage, StageTracker};
pub use types::{
    AlphaMask, ArtifactPaths, GenerationOutput, Language, ProcessingTimings, StyleRequest,
    SynthesisResult,
};
pub use utils::{apply_alpha, AspectPreservingResizer, ChromaKey, UpscaleRestorer};

use std::sync::Arc;

/// Run [`StyleTextProcessor::generate`] on Tokio's blocking pool
///
/// The pipeline is CPU-bound; async callers should not run it on a worker
/// thread directly.
pub async fn generate_styled_text(
    processor: Arc<StyleTextProcessor>,
    image_bytes: Vec<u8>,
    text: String,
    language: Language,
) -> Result<GenerationOutput> {
    tokio::task::spawn_blocking(move || processor.generate(&image_bytes, &text, language))
        .await
        .map_err(|e| StyleTextError::internal(format!("generation task failed: {}", e)))?
}
