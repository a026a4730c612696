//! Message-list state and the tool routing condition.

use super::END;
use crate::llm::Message;
use serde::{Deserialize, Serialize};

/// Name of the node that executes tool calls.
pub const TOOLS_NODE: &str = "tools";

/// Graph state holding the ordered conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesState {
    pub messages: Vec<Message>,
}

impl MessagesState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// Route to the tools node when the last message asks for tool calls, otherwise end.
pub fn tools_condition(state: &MessagesState) -> String {
    match state.last() {
        Some(message) if !message.tool_calls().is_empty() => TOOLS_NODE.to_string(),
        _ => END.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolInvocation;

    #[test]
    fn test_routes_tool_calls_to_tools() {
        let state = MessagesState::new(vec![
            Message::human("2+2?"),
            Message::Assistant {
                content: None,
                tool_calls: vec![ToolInvocation {
                    id: "1".to_string(),
                    name: "add".to_string(),
                    arguments: r#"{"a":2,"b":2}"#.to_string(),
                }],
            },
        ]);
        assert_eq!(tools_condition(&state), TOOLS_NODE);
    }

    #[test]
    fn test_routes_everything_else_to_end() {
        assert_eq!(tools_condition(&MessagesState::default()), END);

        let answered = MessagesState::new(vec![Message::assistant("FINAL ANSWER: 4")]);
        assert_eq!(tools_condition(&answered), END);

        let errored = MessagesState::new(vec![Message::human("Error in assistant: timeout")]);
        assert_eq!(tools_condition(&errored), END);
    }
}
