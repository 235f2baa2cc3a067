//! Error types for the Metis learning core
//!
//! This module provides comprehensive error handling using thiserror for
//! structured error definitions and anyhow for error propagation.

use crate::types::ModelId;
use thiserror::Error;

/// Main error type for Metis operations
#[derive(Error, Debug)]
pub enum MetisError {
    /// Referenced model does not exist
    #[error("Learning model not found: {0}")]
    ModelNotFound(ModelId),

    /// Malformed record or feedback, rejected before any state mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The underlying knowledge/atom store rejected a write (retryable)
    #[error("Knowledge store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Metis operations
pub type Result<T> = std::result::Result<T, MetisError>;

/// Convert anyhow::Error to MetisError
impl From<anyhow::Error> for MetisError {
    fn from(err: anyhow::Error) -> Self {
        MetisError::Other(err.to_string())
    }
}
