//! Error types for kernel evaluation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GkmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load kernel engine: {0}")]
    EngineLoad(String),

    #[error("Kernel engine failure: {0}")]
    EngineFailure(String),

    #[error("Model fit failed: {0}")]
    FitFailure(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl GkmError {
    /// Shorthand for building a configuration error from anything printable
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for building a fit failure from anything printable
    pub fn fit(msg: impl Into<String>) -> Self {
        Self::FitFailure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GkmError>;
