//! Pre-flight checks before contacting the assistant service.
//!
//! Validates that an API key is available before starting operations that
//! would otherwise fail on the first remote call.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::{Result, ScoutError};
use regex::Regex;
use std::sync::OnceLock;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Research, chat and resume talk to the assistant service.
    Research,
    /// Listing or invoking local tools needs nothing remote.
    Tools,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Research => check_api_key(settings)?,
        Operation::Tools => {
            // Search tools need no credentials
        }
    }
    Ok(())
}

/// Check that an OpenAI API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    let key = settings.api_key().ok_or_else(|| {
        ScoutError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...' \
             or add api_key under [openai] in the config file"
                .to_string(),
        )
    })?;

    if !looks_like_api_key(&key) {
        Output::warning("The OpenAI API key does not look like a classic 'sk-' key; trying it anyway.");
    }
    Ok(())
}

/// Whether a key has the classic `sk-` shape.
pub fn looks_like_api_key(key: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^sk-[a-zA-Z0-9]{40,60}$").expect("Invalid regex"))
        .is_match(key)
}

/// Whether an error message points at a bad or missing API key.
pub fn is_api_key_error(message: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)(api)(_|-|\s)(key)").expect("Invalid regex"))
        .is_match(message)
}
