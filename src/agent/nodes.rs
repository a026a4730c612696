//! Nodes of the agent graph.

use crate::error::Result;
use crate::graph::{MessagesState, Node};
use crate::llm::{ChatModel, Message, ToolInvocation};
use crate::tools::{parse_tool_call, ToolContext, ToolSpec};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the node that injects the system prompt.
pub const RETRIEVER_NODE: &str = "retriever";

/// Name of the node that calls the model.
pub const ASSISTANT_NODE: &str = "assistant";

/// Puts the system prompt first, replacing any other system messages.
pub struct RetrieverNode {
    system_prompt: String,
}

impl RetrieverNode {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }
}

#[async_trait]
impl Node<MessagesState> for RetrieverNode {
    async fn run(&self, state: MessagesState) -> Result<MessagesState> {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(state.messages.into_iter().filter(|m| !m.is_system()));
        Ok(MessagesState::new(messages))
    }
}

/// Calls the model with every tool bound.
pub struct AssistantNode {
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolSpec>,
}

impl AssistantNode {
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<ToolSpec>) -> Self {
        Self { model, tools }
    }
}

#[async_trait]
impl Node<MessagesState> for AssistantNode {
    async fn run(&self, mut state: MessagesState) -> Result<MessagesState> {
        debug!("Invoking {} with {} message(s)", self.model.name(), state.messages.len());

        // A failed model call ends the run with the error as the last message.
        match self.model.invoke(&state.messages, &self.tools).await {
            Ok(reply) => state.push(reply),
            Err(e) => {
                warn!("Error in assistant: {}", e);
                state.push(Message::human(format!("Error in assistant: {}", e)));
            }
        }
        Ok(state)
    }
}

/// Executes the tool calls of the last assistant message.
pub struct ToolNode {
    context: Arc<ToolContext>,
}

impl ToolNode {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    async fn call(&self, invocation: &ToolInvocation) -> String {
        info!("Calling tool {} with args: {}", invocation.name, invocation.arguments);

        let result = match parse_tool_call(&invocation.name, &invocation.arguments) {
            Ok(tool) => self.context.execute(&tool).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {}", invocation.name, e);
                format!("Error: {}\n Please fix your mistakes.", e)
            }
        }
    }
}

#[async_trait]
impl Node<MessagesState> for ToolNode {
    async fn run(&self, mut state: MessagesState) -> Result<MessagesState> {
        let invocations = state
            .last()
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default();

        let outputs = join_all(invocations.iter().map(|call| self.call(call))).await;

        for (invocation, content) in invocations.into_iter().zip(outputs) {
            state.push(Message::Tool {
                tool_call_id: invocation.id,
                name: invocation.name,
                content,
            });
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::SleuthError;

    struct Broken;

    #[async_trait]
    impl ChatModel for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn invoke(&self, _messages: &[Message], _tools: &[ToolSpec]) -> Result<Message> {
            Err(SleuthError::Llm("quota exceeded".to_string()))
        }
    }

    fn invocation(id: &str, name: &str, arguments: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn test_retriever_puts_single_system_prompt_first() {
        let state = MessagesState::new(vec![
            Message::human("hi"),
            Message::system("stale prompt"),
            Message::assistant("hello"),
        ]);

        let state = RetrieverNode::new("be terse").run(state).await.unwrap();
        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[0], Message::system("be terse"));
        assert_eq!(state.messages.iter().filter(|m| m.is_system()).count(), 1);
        assert_eq!(state.messages[1], Message::human("hi"));
    }

    #[tokio::test]
    async fn test_assistant_records_model_failure() {
        let node = AssistantNode::new(Arc::new(Broken), Vec::new());
        let state = node
            .run(MessagesState::new(vec![Message::human("hi")]))
            .await
            .unwrap();

        let last = state.last().unwrap();
        assert!(matches!(last, Message::Human { .. }));
        assert!(last.text().unwrap().starts_with("Error in assistant:"));
    }

    #[tokio::test]
    async fn test_tool_node_keeps_call_order_and_reports_errors() {
        let context = Arc::new(ToolContext::new(&Settings::default()).unwrap());
        let state = MessagesState::new(vec![Message::Assistant {
            content: None,
            tool_calls: vec![
                invocation("1", "multiply", r#"{"a": 6, "b": 7}"#),
                invocation("2", "divide", r#"{"a": 1, "b": 0}"#),
                invocation("3", "no_such_tool", "{}"),
            ],
        }]);

        let state = ToolNode::new(context).run(state).await.unwrap();
        assert_eq!(state.messages.len(), 4);

        match &state.messages[1] {
            Message::Tool { tool_call_id, name, content } => {
                assert_eq!(tool_call_id, "1");
                assert_eq!(name, "multiply");
                assert_eq!(content, "42");
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(
            state.messages[2].text(),
            Some("Error: Cannot divide by zero.\n Please fix your mistakes.")
        );
        assert!(state.messages[3].text().unwrap().starts_with("Error: "));
    }
}
