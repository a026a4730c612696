//! Agent graph assembly and the run facade.

use super::nodes::{AssistantNode, RetrieverNode, ToolNode, ASSISTANT_NODE, RETRIEVER_NODE};
use crate::config::{load_system_prompt, Provider, Settings};
use crate::error::Result;
use crate::graph::{tools_condition, CompiledGraph, MessagesState, StateGraph, START, TOOLS_NODE};
use crate::llm::{ChatModel, Message, OpenAiChatModel};
use crate::tools::{tool_definitions, ToolContext};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Build the agent graph for a provider using its configured model.
pub fn build_graph(
    provider: Provider,
    settings: &Settings,
) -> Result<CompiledGraph<MessagesState>> {
    build_graph_for_model(provider, settings, None)
}

/// Build the agent graph, optionally overriding the provider's model name.
pub fn build_graph_for_model(
    provider: Provider,
    settings: &Settings,
    model: Option<&str>,
) -> Result<CompiledGraph<MessagesState>> {
    let mut chat = OpenAiChatModel::new(provider, settings.providers.get(provider))?;
    if let Some(model) = model {
        chat = chat.with_model(model);
    }
    info!("Building agent graph with {} ({})", provider, chat.name());

    let tools = Arc::new(ToolContext::new(settings)?);
    let system_prompt = load_system_prompt(settings)?;

    build_graph_with_model(
        Arc::new(chat),
        tools,
        system_prompt,
        settings.agent.recursion_limit,
    )
}

/// Wire retriever, assistant and tools nodes around an arbitrary model.
pub fn build_graph_with_model(
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolContext>,
    system_prompt: String,
    recursion_limit: usize,
) -> Result<CompiledGraph<MessagesState>> {
    let mut graph = StateGraph::new();
    graph
        .add_node(RETRIEVER_NODE, RetrieverNode::new(system_prompt))
        .add_node(ASSISTANT_NODE, AssistantNode::new(model, tool_definitions()))
        .add_node(TOOLS_NODE, ToolNode::new(tools))
        .add_edge(START, RETRIEVER_NODE)
        .add_edge(RETRIEVER_NODE, ASSISTANT_NODE)
        .add_conditional_edges(ASSISTANT_NODE, tools_condition)
        .add_edge(TOOLS_NODE, ASSISTANT_NODE)
        .with_recursion_limit(recursion_limit);

    graph.compile()
}

/// Build the user message for a question, mentioning an attached task file if any.
pub fn format_question(question: &str, task_id: Option<&str>, file_name: Option<&str>) -> String {
    match (task_id, file_name) {
        (Some(task_id), Some(file_name)) => format!(
            "{}\n\nTask ID: {}\nAttached file: {}",
            question, task_id, file_name
        ),
        (Some(task_id), None) => format!("{}\n\nTask ID: {}", question, task_id),
        _ => question.to_string(),
    }
}

/// Agent that answers questions by running the tool-calling graph.
pub struct Agent {
    graph: CompiledGraph<MessagesState>,
}

impl Agent {
    /// Create an agent for the provider.
    pub fn new(provider: Provider, settings: &Settings, model: Option<&str>) -> Result<Self> {
        Ok(Self {
            graph: build_graph_for_model(provider, settings, model)?,
        })
    }

    /// Wrap an already compiled graph.
    pub fn from_graph(graph: CompiledGraph<MessagesState>) -> Self {
        Self { graph }
    }

    /// Run the agent on a single question.
    pub async fn run(&self, question: &str) -> Result<AgentResponse> {
        self.run_messages(vec![Message::human(question)]).await
    }

    /// Continue a conversation. Earlier turns are passed through unchanged.
    pub async fn run_messages(&self, messages: Vec<Message>) -> Result<AgentResponse> {
        let run_id = uuid::Uuid::new_v4();
        let carried = messages.iter().filter(|m| !m.is_system()).count();

        let run = self
            .graph
            .run(MessagesState::new(messages))
            .instrument(info_span!("agent_run", %run_id))
            .await?;

        let steps = run.path.len();
        info!("Agent finished after {} step(s)", steps);

        Ok(AgentResponse::from_messages(run.state.messages, carried, steps))
    }
}

/// Response from an agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    /// Text of the final message.
    pub content: String,
    /// Tool calls made during this run.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of node executions.
    pub steps: usize,
    /// Full conversation, system prompt first.
    pub messages: Vec<Message>,
}

impl AgentResponse {
    fn from_messages(messages: Vec<Message>, carried: usize, steps: usize) -> Self {
        let content = messages
            .last()
            .and_then(|m| m.text())
            .unwrap_or_default()
            .to_string();

        // The retriever rewrites the input to one system prompt plus the carried messages.
        let new_from = (carried + 1).min(messages.len());
        let tool_calls = collect_tool_calls(&messages[new_from..]);

        Self {
            content,
            tool_calls,
            steps,
            messages,
        }
    }

    /// Text after the last `FINAL ANSWER:` marker, or the whole content.
    pub fn final_answer(&self) -> &str {
        match self.content.rfind("FINAL ANSWER:") {
            Some(idx) => self.content[idx + "FINAL ANSWER:".len()..].trim(),
            None => self.content.trim(),
        }
    }
}

/// Pair each tool invocation with its tool message.
fn collect_tool_calls(messages: &[Message]) -> Vec<ToolCallRecord> {
    let results: HashMap<&str, &str> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Tool {
                tool_call_id,
                content,
                ..
            } => Some((tool_call_id.as_str(), content.as_str())),
            _ => None,
        })
        .collect();

    messages
        .iter()
        .flat_map(|m| m.tool_calls())
        .map(|call| ToolCallRecord {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result: results.get(call.id.as_str()).copied().unwrap_or_default().to_string(),
        })
        .collect()
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SleuthError;
    use crate::llm::ToolInvocation;
    use crate::tools::ToolSpec;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies from a fixed script and records what it was sent.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<Message>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn new(mut replies: Vec<Result<Message>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
            assert_eq!(tools.len(), 12);
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(Message::assistant("out of script")))
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> Message {
        Message::Assistant {
            content: None,
            tool_calls: vec![ToolInvocation {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }

    fn agent(model: Arc<ScriptedModel>, limit: usize) -> Agent {
        let tools = Arc::new(ToolContext::new(&Settings::default()).unwrap());
        let graph = build_graph_with_model(model, tools, "SYSTEM".to_string(), limit).unwrap();
        Agent::from_graph(graph)
    }

    #[tokio::test]
    async fn test_tool_loop_until_answer() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(tool_call("c1", "add", r#"{"a": 2, "b": 3}"#)),
            Ok(tool_call("c2", "multiply", r#"{"a": 5, "b": 4}"#)),
            Ok(Message::assistant("FINAL ANSWER: 20")),
        ]));

        let response = agent(model.clone(), 25).run("(2+3)*4?").await.unwrap();

        assert_eq!(response.content, "FINAL ANSWER: 20");
        assert_eq!(response.final_answer(), "20");
        // retriever, assistant, tools, assistant, tools, assistant
        assert_eq!(response.steps, 6);
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].result, "5");
        assert_eq!(response.tool_calls[1].result, "20");
        assert_eq!(response.messages[0], Message::system("SYSTEM"));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|msgs| msgs[0] == Message::system("SYSTEM")));
    }

    #[tokio::test]
    async fn test_model_error_ends_run() {
        let model = Arc::new(ScriptedModel::new(vec![Err(SleuthError::Llm(
            "rate limited".to_string(),
        ))]));

        let response = agent(model, 25).run("hi").await.unwrap();
        assert!(response.content.starts_with("Error in assistant:"));
        assert!(response.content.contains("rate limited"));
        assert_eq!(response.steps, 2);
        assert!(response.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_recursion_limit_stops_endless_tool_use() {
        let replies = (0..20)
            .map(|i| Ok(tool_call(&format!("c{}", i), "reverse_string", r#"{"s": "ab"}"#)))
            .collect();
        let model = Arc::new(ScriptedModel::new(replies));

        let err = agent(model, 5).run("loop").await.unwrap_err();
        assert!(matches!(err, SleuthError::RecursionLimit(5)));
    }

    #[tokio::test]
    async fn test_follow_up_only_reports_new_tool_calls() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(tool_call("c1", "reverse_string", r#"{"s": "cba"}"#)),
            Ok(Message::assistant("abc")),
            Ok(Message::assistant("done")),
        ]));
        let agent = agent(model, 25);

        let first = agent.run("reverse cba").await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);

        let mut history = first.messages;
        history.push(Message::human("thanks"));
        let second = agent.run_messages(history).await.unwrap();
        assert_eq!(second.content, "done");
        assert!(second.tool_calls.is_empty());
        assert_eq!(second.messages.iter().filter(|m| m.is_system()).count(), 1);
    }

    #[test]
    fn test_format_question() {
        assert_eq!(format_question("Q?", None, None), "Q?");
        assert_eq!(
            format_question("Q?", Some("abc"), Some("abc.mp3")),
            "Q?\n\nTask ID: abc\nAttached file: abc.mp3"
        );
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "wiki_search".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "Found results".to_string(),
        };
        assert_eq!(format!("{}", record), r#"wiki_search({"query": "test"})"#);
    }
}
