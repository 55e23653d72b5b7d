//! Error types for the Mes Droits assistant.
//!
//! This module defines a unified error enum covering every error category
//! in the application: configuration, I/O, LLM calls, structured-output
//! parsing, retrieval, and vector-store writes.

use thiserror::Error;

/// Unified error type for the Mes Droits assistant.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Structured output from the model does not match the expected shape
    #[error("Schema violation: {0}")]
    Schema(String),

    /// The retrieval capability failed; aborts a pipeline run
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Vector store errors
    #[error("Store error: {0}")]
    Store(String),

    /// An ingestion batch exhausted its retries; fatal for the run
    #[error("Batch write failed: {0}")]
    BatchWrite(String),

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
