//! Tracing configuration for structured logging
//!
//! Library code only emits events and spans; the server binary installs the
//! subscriber configured here.

use crate::config::{LogFormat, LoggingConfig};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Name of the log file written next to the artifacts
pub const LOG_FILE_NAME: &str = "predict.log";

/// Tracing configuration builder
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Verbosity level (maps to log levels)
    pub verbosity: u8,
    /// Console output format
    pub format: LogFormat,
    /// Additional plain-text log file
    pub log_file: Option<PathBuf>,
    /// Environment filter string (overrides verbosity and `RUST_LOG` if set)
    pub env_filter: Option<String>,
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings from the service configuration, logging to `output_dir/predict.log`
    #[must_use]
    pub fn from_logging(logging: &LoggingConfig, output_dir: &Path) -> Self {
        Self {
            verbosity: logging.verbosity,
            format: logging.format,
            log_file: logging
                .log_to_file
                .then(|| output_dir.join(LOG_FILE_NAME)),
            env_filter: None,
        }
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Convert verbosity level to tracing filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",  // Default: informational messages and above
            1 => "debug", // -v: internal state and computations
            _ => "trace", // -vv+: extremely detailed traces
        }
    }

    fn filter(&self) -> anyhow::Result<EnvFilter> {
        if let Some(filter) = &self.env_filter {
            return EnvFilter::try_new(filter).context("Invalid log filter");
        }
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(self.verbosity_to_filter()).context("Invalid log filter"),
        }
    }

    /// Install the global subscriber
    ///
    /// With a log file configured, the returned guard flushes it on drop and
    /// must be held for the life of the process.
    pub fn init(self) -> anyhow::Result<Option<WorkerGuard>> {
        let filter = self.filter()?;

        let console_layer = match self.format {
            LogFormat::Console => fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .compact()
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .compact()
                .boxed(),
            #[cfg(feature = "tracing-json")]
            LogFormat::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            #[cfg(not(feature = "tracing-json"))]
            LogFormat::Json => fmt::layer().with_ansi(false).compact().boxed(),
        };

        let (file_layer, guard) = match &self.log_file {
            Some(path) => {
                let dir = path.parent().unwrap_or_else(|| Path::new("."));
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
                let file_name = path
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new(LOG_FILE_NAME));

                let appender = tracing_appender::rolling::never(dir, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed();
                (Some(layer), Some(guard))
            },
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;

        #[cfg(not(feature = "tracing-json"))]
        if self.format == LogFormat::Json {
            tracing::warn!("JSON logs need the 'tracing-json' feature, using compact output");
        }
        if let Some(path) = &self.log_file {
            tracing::debug!(path = %path.display(), "Writing log file");
        }

        Ok(guard)
    }
}
