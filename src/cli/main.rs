//! StyleText API server
//!
//! Loads the configuration, installs logging, builds the synthesizer once
//! and serves the HTTP API until Ctrl-C.

use super::config::CliConfigBuilder;
use crate::{
    config::ServiceConfig,
    inference::DefaultSynthesizerFactory,
    processor::ProcessorState,
    server::{self, AppState},
    tracing_config::TracingConfig,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

/// Styled text image generation server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "styletext-server")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory for per-request artifacts and predict.log [default: output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Synthesizer to load at startup (tract, glyph) [default: tract]
    #[arg(short, long)]
    pub synthesizer: Option<String>,

    /// Path to the StyleText ONNX export (tract synthesizer)
    #[arg(short, long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Font for English text
    #[arg(long, value_name = "FILE")]
    pub font_en: Option<PathBuf>,

    /// Font for Chinese text
    #[arg(long, value_name = "FILE")]
    pub font_ch: Option<PathBuf>,

    /// Font for Korean text
    #[arg(long, value_name = "FILE")]
    pub font_ko: Option<PathBuf>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Console log format
    #[arg(long, value_enum)]
    pub log_format: Option<CliLogFormat>,

    /// Do not write <output-dir>/predict.log
    #[arg(long)]
    pub no_log_file: bool,

    /// Do not write per-request artifacts
    #[arg(long)]
    pub no_persist: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    Json,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfigBuilder::from_cli(&cli)?;

    if cli.print_config {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).context("Failed to serialise configuration")?
        );
        return Ok(());
    }

    let _log_guard = TracingConfig::from_logging(&config.logging, &config.pipeline.output_dir)
        .init()
        .context("Failed to initialize tracing")?;

    run(config).await
}

/// Composition root: build the processor once and serve it
async fn run(config: ServiceConfig) -> Result<()> {
    info!(
        synthesizer = %config.synthesizer.kind,
        output_dir = %config.pipeline.output_dir.display(),
        "Starting StyleText API"
    );

    let state = ProcessorState::initialize(
        &DefaultSynthesizerFactory,
        &config.synthesizer,
        config.pipeline.clone(),
    )
    .context("Failed to initialize the generation pipeline")?;

    match &state {
        ProcessorState::Ready(processor) => {
            info!(synthesizer = processor.synthesizer_name(), "✅ Synthesizer initialized successfully");
        },
        ProcessorState::Unavailable(reason) => {
            warn!(reason = %reason, "⚠️ Serving without a model, /generate will return 503");
        },
    }

    let router = server::router(AppState::new(state), config.server.max_upload_bytes);
    server::serve(&config.server.bind_address(), router).await
}
