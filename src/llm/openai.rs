//! Chat model backed by an OpenAI-compatible chat completions endpoint.

use super::{ChatModel, Message, ToolInvocation};
use crate::config::{Provider, ProviderSettings};
use crate::error::{Result, SleuthError};
use crate::openai::create_client;
use crate::tools::ToolSpec;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model for Gemini or Groq through their OpenAI-compatible APIs.
pub struct OpenAiChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    /// Create a chat model for the provider using its configured model.
    pub fn new(provider: Provider, settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(provider, settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(to_request_messages(messages)?)
            .temperature(self.temperature);

        if !tools.is_empty() {
            builder.tools(to_chat_tools(tools));
        }

        let request = builder.build()?;
        let response = self.client.chat().create(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SleuthError::Llm("No response from model".to_string()))?;

        let tool_calls: Vec<ToolInvocation> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                id: if call.id.is_empty() {
                    format!("call_{}", uuid::Uuid::new_v4().simple())
                } else {
                    call.id
                },
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!("Model returned {} tool call(s)", tool_calls.len());

        Ok(Message::Assistant {
            content: choice.message.content,
            tool_calls,
        })
    }
}

/// Convert tool specs into chat completion tool definitions.
pub fn to_chat_tools(tools: &[ToolSpec]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.to_string(),
                description: Some(tool.description.to_string()),
                parameters: Some(tool.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Convert conversation messages into chat completion request messages.
pub fn to_request_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages.iter().map(to_request_message).collect()
}

fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let converted: ChatCompletionRequestMessage = match message {
        Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.as_str())
            .build()?
            .into(),
        Message::Human { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.as_str())
            .build()?
            .into(),
        Message::Assistant { content, tool_calls } => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(text) = content {
                builder.content(text.as_str());
            }
            if !tool_calls.is_empty() {
                builder.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            } else if content.is_none() {
                builder.content("");
            }
            builder.build()?.into()
        }
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(tool_call_id.as_str())
            .content(content.as_str())
            .build()?
            .into(),
    };
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_definitions;

    #[test]
    fn test_converts_every_message_kind() {
        let messages = vec![
            Message::system("be brief"),
            Message::human("what is 2 + 3?"),
            Message::Assistant {
                content: None,
                tool_calls: vec![ToolInvocation {
                    id: "call_1".to_string(),
                    name: "add".to_string(),
                    arguments: r#"{"a":2,"b":3}"#.to_string(),
                }],
            },
            Message::Tool {
                tool_call_id: "call_1".to_string(),
                name: "add".to_string(),
                content: "5".to_string(),
            },
            Message::assistant("FINAL ANSWER: 5"),
        ];

        let converted = to_request_messages(&messages).unwrap();
        assert_eq!(converted.len(), 5);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(converted[3], ChatCompletionRequestMessage::Tool(_)));

        let json = serde_json::to_value(&converted[2]).unwrap();
        assert_eq!(json["tool_calls"][0]["function"]["name"], "add");
        let json = serde_json::to_value(&converted[3]).unwrap();
        assert_eq!(json["tool_call_id"], "call_1");
    }

    #[test]
    fn test_chat_tools_cover_definitions() {
        let tools = to_chat_tools(&tool_definitions());
        assert_eq!(tools.len(), tool_definitions().len());
        assert!(tools.iter().all(|t| t.function.parameters.is_some()));
    }
}
