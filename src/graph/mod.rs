//! Minimal state-graph execution.
//!
//! A graph is a set of named nodes that each transform a shared state, wired
//! together by fixed or conditional edges between the virtual `START` and
//! `END` nodes. Execution is strictly sequential and bounded by a recursion
//! limit.

mod messages;
mod state_graph;

pub use messages::{tools_condition, MessagesState, TOOLS_NODE};
pub use state_graph::{
    CompiledGraph, GraphRun, Node, Router, StateGraph, DEFAULT_RECURSION_LIMIT, END, START,
};
