//! Error types for naix.
//!
//! This module defines a unified error enum covering every failure category
//! of the prompt-assembly pipeline: configuration, I/O, settings storage,
//! template expansion and serialization.

use thiserror::Error;

/// Unified error type for naix.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Expansion either fully succeeds or fails with one of these variants;
/// there is no partial output.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Story-string syntax or directive errors
    #[error("Template error: {0}")]
    Template(String),

    /// Prompt assembly errors outside of template expansion
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Settings store errors
    #[error("Settings error: {0}")]
    Settings(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
