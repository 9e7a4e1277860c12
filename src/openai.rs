//! OpenAI client configuration with sensible defaults.

use crate::config::Settings;
use crate::error::{Result, ScoutError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client from settings.
///
/// The API key comes from `[openai] api_key` when set, otherwise from
/// `OPENAI_API_KEY`. The assistants beta header is set by `OpenAIConfig`.
pub fn create_client(settings: &Settings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings
        .api_key()
        .ok_or_else(|| ScoutError::Config("No OpenAI API key configured".to_string()))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &settings.openai.api_base {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(settings.openai.timeout_secs))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
