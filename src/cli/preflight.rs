//! Pre-flight checks before expensive operations.
//!
//! Validates that the API keys an operation needs are available before
//! starting an agent run that would otherwise fail midway.

use crate::config::{lookup_api_key, Provider, Settings};
use crate::error::{Result, SleuthError};
use crate::openai::api_key_envs;
use crate::tools::search::TAVILY_API_KEY_ENV;
use crate::tools::ToolCall;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Agent runs need the provider's API key.
    Ask(Provider),
    /// Direct tool calls need the key of the service the tool talks to.
    CallTool(&'a ToolCall),
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation<'_>, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask(provider) => check_provider_key(provider, settings)?,
        Operation::CallTool(call) => check_tool_key(call, settings)?,
    }
    Ok(())
}

/// Check that the provider's API key is configured.
pub fn check_provider_key(provider: Provider, settings: &Settings) -> Result<()> {
    let names = api_key_envs(provider, settings.providers.get(provider));
    require_any(&names)
}

/// Check the key of the external service a tool calls, if it calls one.
pub fn check_tool_key(call: &ToolCall, settings: &Settings) -> Result<()> {
    match call {
        ToolCall::WebSearch { .. } => require_any(&[TAVILY_API_KEY_ENV]),
        ToolCall::YoutubeAnalyze { .. } | ToolCall::AnalyzeAudioFile { .. } => {
            require_any(&[settings.tools.gemini.api_key_env.as_str(), "GEMINI_API_KEY"])
        }
        _ => Ok(()),
    }
}

fn require_any(names: &[&str]) -> Result<()> {
    match lookup_api_key(names) {
        Some(_) => Ok(()),
        None => Err(SleuthError::MissingApiKey(names.join(" or "))),
    }
}
