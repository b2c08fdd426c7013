//! Configuration types for the generation service

use crate::error::{Result, StyleTextError};
use crate::utils::matte::ChromaKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported model collaborator strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerKind {
    /// StyleText ONNX export executed with Tract (pure Rust)
    Tract,
    /// Model-free glyph rasteriser coloured from the style image
    Glyph,
}

impl Default for SynthesizerKind {
    fn default() -> Self {
        Self::Tract
    }
}

impl std::fmt::Display for SynthesizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tract => write!(f, "tract"),
            Self::Glyph => write!(f, "glyph"),
        }
    }
}

impl std::str::FromStr for SynthesizerKind {
    type Err = StyleTextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tract" => Ok(Self::Tract),
            "glyph" => Ok(Self::Glyph),
            other => Err(StyleTextError::invalid_config(format!(
                "Unknown synthesizer '{}'. Supported: tract, glyph",
                other
            ))),
        }
    }
}

/// Font files used to rasterise the target text, one per language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    pub en: PathBuf,
    pub ch: PathBuf,
    pub ko: PathBuf,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            en: PathBuf::from("fonts/en_standard.ttf"),
            ch: PathBuf::from("fonts/ch_standard.ttf"),
            ko: PathBuf::from("fonts/ko_standard.ttf"),
        }
    }
}

/// Configuration of the model collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Which inference strategy to construct at startup
    pub kind: SynthesizerKind,

    /// Path to the ONNX export (required for `tract`)
    pub model_path: Option<PathBuf>,

    /// Fonts for standard text rendering
    pub fonts: FontConfig,

    /// Gray level of the standard text canvas fed to the model
    pub text_background: u8,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            kind: SynthesizerKind::default(),
            model_path: None,
            fonts: FontConfig::default(),
            text_background: 127,
        }
    }
}

impl SynthesizerConfig {
    /// Validate the synthesizer configuration
    pub fn validate(&self) -> Result<()> {
        if self.kind == SynthesizerKind::Tract && self.model_path.is_none() {
            return Err(StyleTextError::invalid_config(
                "The tract synthesizer requires 'model_path'",
            ));
        }
        Ok(())
    }
}

/// Configuration of the post-processing pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Height the style image is normalised to before synthesis
    pub target_height: u32,

    /// Background band removed from the synthesised text
    pub chroma_key: ChromaKey,

    /// Directory receiving per-request artifacts
    pub output_dir: PathBuf,

    /// Write per-request artifacts (default: true)
    pub persist_artifacts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_height: 32,
            chroma_key: ChromaKey::default(),
            output_dir: PathBuf::from("output"),
            persist_artifacts: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate all pipeline parameters
    ///
    /// # Validation Rules
    ///
    /// - Target height: 1-4096 (inclusive)
    /// - Chroma key: lower bound must not exceed upper bound on any channel
    pub fn validate(&self) -> Result<()> {
        if self.target_height == 0 || self.target_height > 4096 {
            return Err(StyleTextError::config_value_error(
                "target height",
                self.target_height,
                "1-4096",
                Some(32),
            ));
        }

        self.chroma_key.validate()?;

        if self.output_dir.as_os_str().is_empty() {
            return Err(StyleTextError::invalid_config("output_dir must not be empty"));
        }

        Ok(())
    }
}

/// Builder for `PipelineConfig`
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the normalisation height
    #[must_use]
    pub fn target_height(mut self, height: u32) -> Self {
        self.config.target_height = height;
        self
    }

    /// Set the chroma key band
    #[must_use]
    pub fn chroma_key(mut self, chroma_key: ChromaKey) -> Self {
        self.config.chroma_key = chroma_key;
        self
    }

    /// Set the artifact directory
    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Enable or disable artifact persistence
    #[must_use]
    pub fn persist_artifacts(mut self, persist: bool) -> Self {
        self.config.persist_artifacts = persist;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Console,
    Compact,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Console
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
    pub format: LogFormat,
    /// Also write `predict.log` into the output directory
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: LogFormat::default(),
            log_to_file: true,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub synthesizer: SynthesizerConfig,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| StyleTextError::file_io_error("read config file", path_ref, &e))?;
        serde_json::from_str(&content).map_err(|e| {
            StyleTextError::invalid_config(format!(
                "Failed to parse '{}': {}",
                path_ref.display(),
                e
            ))
        })
    }

    /// Validate every section
    ///
    /// Synthesizer problems are not checked here: they surface when the
    /// synthesizer is constructed and leave the service unavailable.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(StyleTextError::config_value_error(
                "port",
                self.server.port,
                "1-65535",
                Some(8000),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(StyleTextError::invalid_config(
                "max_upload_bytes must be greater than zero",
            ));
        }
        self.pipeline.validate()
    }
}
