//! Chat messages exchanged between the agent, the model and the tools.

use serde::{Deserialize, Serialize};

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Identifier echoed back in the matching tool message.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    /// Assistant message carrying only text.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }

    /// Tool calls requested by this message (empty unless it is an assistant message).
    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Text content of the message, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::System { content }
            | Message::Human { content }
            | Message::Tool { content, .. } => Some(content),
            Message::Assistant { content, .. } => content.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_calls_only_on_assistant() {
        let msg = Message::Assistant {
            content: None,
            tool_calls: vec![ToolInvocation {
                id: "call_1".to_string(),
                name: "add".to_string(),
                arguments: r#"{"a": 1, "b": 2}"#.to_string(),
            }],
        };
        assert_eq!(msg.tool_calls().len(), 1);
        assert!(Message::human("hi").tool_calls().is_empty());
        assert_eq!(msg.text(), None);
    }

    #[test]
    fn test_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::human("hello")).unwrap();
        assert_eq!(json["role"], "human");
        assert_eq!(json["content"], "hello");

        let json = serde_json::to_value(Message::assistant("done")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json.get("tool_calls").is_none());
    }
}
