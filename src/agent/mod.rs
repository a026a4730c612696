//! Tool-calling agent built on the state graph.
//!
//! The graph runs `retriever -> assistant`, then loops through `tools` for as
//! long as the model asks for tool calls.

mod nodes;
mod runner;

pub use nodes::{AssistantNode, RetrieverNode, ToolNode, ASSISTANT_NODE, RETRIEVER_NODE};
pub use runner::{
    build_graph, build_graph_for_model, build_graph_with_model, format_question, Agent,
    AgentResponse, ToolCallRecord,
};
