//! CLI command implementations.

mod ask;
mod call;
mod chat;
mod config;
mod doctor;
mod mcp;
mod serve;
mod tools;

pub use ask::{run_ask, AskOptions};
pub use call::run_call;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use mcp::run_mcp;
pub use serve::run_serve;
pub use tools::run_tools;

use crate::config::{Provider, Settings};
use crate::error::Result;

/// Provider from a command-line flag, falling back to the configured default.
pub(crate) fn resolve_provider(flag: Option<&str>, settings: &Settings) -> Result<Provider> {
    match flag {
        Some(name) => name.parse(),
        None => Ok(settings.agent.provider),
    }
}
