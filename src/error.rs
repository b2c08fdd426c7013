//! Error types for styled text generation

use thiserror::Error;

/// Result type alias for styled text generation operations
pub type Result<T> = std::result::Result<T, StyleTextError>;

/// Error taxonomy for the generation pipeline
#[derive(Error, Debug)]
pub enum StyleTextError {
    /// Uploaded bytes are not a decodable image
    #[error("Decode error: {0}")]
    Decode(String),

    /// The model collaborator failed to initialise at startup
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model collaborator failed during inference
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// PNG serialisation of an in-memory image failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Writing audit artifacts failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Request fields are missing or malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format or processing errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Copyable classification of a [`StyleTextError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    ModelUnavailable,
    Synthesis,
    Encode,
    Persistence,
    InvalidRequest,
    InvalidConfig,
    Io,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::ModelUnavailable => "model_unavailable",
            Self::Synthesis => "synthesis",
            Self::Encode => "encode",
            Self::Persistence => "persistence",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidConfig => "invalid_config",
            Self::Io => "io",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl StyleTextError {
    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new model unavailable error
    pub fn model_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new synthesis error
    pub fn synthesis<S: Into<String>>(msg: S) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::Synthesis(_) => ErrorKind::Synthesis,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Io(_) => ErrorKind::Io,
            Self::Image(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    // Contextual error creators

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create an artifact write error with file context
    pub fn artifact_write_error<P: AsRef<std::path::Path>>(
        path: P,
        error: &dyn std::fmt::Display,
    ) -> Self {
        Self::Persistence(format!(
            "Failed to write artifact '{}': {}",
            path.as_ref().display(),
            error
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create synthesis error naming the synthesizer that failed
    pub fn synthesis_with_backend(backend: &str, operation: &str, error: &str) -> Self {
        Self::Synthesis(format!("{} failed in '{}' synthesizer: {}", operation, backend, error))
    }
}
