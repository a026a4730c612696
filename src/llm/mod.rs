//! Chat model abstraction.
//!
//! The agent talks to models through the [`ChatModel`] trait; the only
//! production implementation targets OpenAI-compatible endpoints.

mod message;
mod openai;

pub use message::{Message, ToolInvocation};
pub use openai::{to_chat_tools, to_request_messages, OpenAiChatModel};

use crate::error::Result;
use crate::tools::ToolSpec;
use async_trait::async_trait;

/// A chat model that can be bound to a set of tools.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, used for logging.
    fn name(&self) -> &str;

    /// Send the conversation and return the assistant reply.
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message>;
}
