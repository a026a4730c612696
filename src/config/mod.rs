//! Configuration module for Sleuth.
//!
//! Handles loading application settings and the agent system prompt.

mod prompts;
mod settings;

pub use prompts::{load_system_prompt, DEFAULT_SYSTEM_PROMPT, SYSTEM_PROMPT_FILE};
pub use settings::{
    lookup_api_key, AgentSettings, GeminiSettings, GeneralSettings, Provider, ProviderSettings,
    ProvidersSettings, Settings, ToolSettings,
};
