//! Error types for Scout.

use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Scout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown tool requested by the assistant: {0}")]
    UnknownTool(String),

    #[error("Run did not reach a terminal state within {0:?}")]
    Timeout(Duration),

    #[error("OpenAI API error: {0}")]
    Transport(#[from] async_openai::error::OpenAIError),

    #[error("Unexpected run state: {0}")]
    Protocol(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Scout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;
