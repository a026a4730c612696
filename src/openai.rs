//! OpenAI-compatible client configuration for the supported providers.

use crate::config::{lookup_api_key, Provider, ProviderSettings};
use crate::error::{Result, SleuthError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for chat completion requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variables tried for the API key of a provider.
pub fn api_key_envs(provider: Provider, settings: &ProviderSettings) -> Vec<&str> {
    let mut names = vec![settings.api_key_env.as_str()];
    if provider == Provider::Google && settings.api_key_env != "GEMINI_API_KEY" {
        names.push("GEMINI_API_KEY");
    }
    names
}

/// Create a client for the provider's OpenAI-compatible endpoint.
pub fn create_client(
    provider: Provider,
    settings: &ProviderSettings,
) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(provider, settings, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    provider: Provider,
    settings: &ProviderSettings,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let names = api_key_envs(provider, settings);
    let api_key =
        lookup_api_key(&names).ok_or_else(|| SleuthError::MissingApiKey(names.join(" or ")))?;

    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
