//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliLogFormat};
use crate::config::{LogFormat, ServiceConfig, SynthesizerKind};
use anyhow::{Context, Result};

/// Merge CLI arguments over the configuration file
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the service configuration from `--config` and flag overrides
    pub(crate) fn from_cli(cli: &Cli) -> Result<ServiceConfig> {
        let mut config = match &cli.config {
            Some(path) => ServiceConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => ServiceConfig::default(),
        };

        if let Some(host) = &cli.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(dir) = &cli.output_dir {
            config.pipeline.output_dir.clone_from(dir);
        }
        if cli.no_persist {
            config.pipeline.persist_artifacts = false;
        }
        if let Some(kind) = &cli.synthesizer {
            config.synthesizer.kind = kind
                .parse::<SynthesizerKind>()
                .context("Invalid --synthesizer")?;
        }
        if let Some(model) = &cli.model {
            config.synthesizer.model_path = Some(model.clone());
        }
        if let Some(font) = &cli.font_en {
            config.synthesizer.fonts.en.clone_from(font);
        }
        if let Some(font) = &cli.font_ch {
            config.synthesizer.fonts.ch.clone_from(font);
        }
        if let Some(font) = &cli.font_ko {
            config.synthesizer.fonts.ko.clone_from(font);
        }
        if cli.verbose > 0 {
            config.logging.verbosity = cli.verbose;
        }
        if let Some(format) = cli.log_format {
            config.logging.format = match format {
                CliLogFormat::Console => LogFormat::Console,
                CliLogFormat::Compact => LogFormat::Compact,
                CliLogFormat::Json => LogFormat::Json,
            };
        }
        if cli.no_log_file {
            config.logging.log_to_file = false;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
