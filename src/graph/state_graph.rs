//! Graph builder and executor.

use crate::error::{Result, SleuthError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Name of the virtual entry node.
pub const START: &str = "__start__";

/// Name of the virtual exit node.
pub const END: &str = "__end__";

/// Default number of node executions allowed per run.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// A step of the graph: takes the state and returns the updated state.
#[async_trait]
pub trait Node<S>: Send + Sync {
    async fn run(&self, state: S) -> Result<S>;
}

/// Picks the next node from the current state.
pub type Router<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

enum Edge<S> {
    Fixed(String),
    Conditional(Router<S>),
}

/// Builder for a state graph.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, Edge<S>)>,
    recursion_limit: usize,
}

impl<S: Send + 'static> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Register a node under `name`. Re-registering a name replaces the node.
    pub fn add_node(&mut self, name: &str, node: impl Node<S> + 'static) -> &mut Self {
        self.nodes.insert(name.to_string(), Arc::new(node));
        self
    }

    /// Always continue from `from` to `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) -> &mut Self {
        self.edges.push((from.to_string(), Edge::Fixed(to.to_string())));
        self
    }

    /// Continue from `from` to whichever node `router` names.
    pub fn add_conditional_edges<F>(&mut self, from: &str, router: F) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        self.edges
            .push((from.to_string(), Edge::Conditional(Arc::new(router))));
        self
    }

    /// Maximum node executions per run.
    pub fn with_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Validate the topology and freeze it.
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        if self.nodes.contains_key(START) || self.nodes.contains_key(END) {
            return Err(SleuthError::Graph(format!(
                "'{}' and '{}' are reserved node names",
                START, END
            )));
        }

        let mut edges: HashMap<String, Edge<S>> = HashMap::new();
        for (from, edge) in self.edges {
            if from == END {
                return Err(SleuthError::Graph("END cannot have outgoing edges".to_string()));
            }
            if from != START && !self.nodes.contains_key(&from) {
                return Err(SleuthError::Graph(format!("Edge starts at unknown node '{}'", from)));
            }
            if let Edge::Fixed(to) = &edge {
                if to == START {
                    return Err(SleuthError::Graph("START cannot be an edge target".to_string()));
                }
                if to != END && !self.nodes.contains_key(to) {
                    return Err(SleuthError::Graph(format!("Edge targets unknown node '{}'", to)));
                }
            }
            if edges.contains_key(&from) {
                return Err(SleuthError::Graph(format!(
                    "Node '{}' has more than one outgoing edge",
                    from
                )));
            }
            edges.insert(from, edge);
        }

        if !edges.contains_key(START) {
            return Err(SleuthError::Graph("Graph has no entry edge from START".to_string()));
        }

        if let Some(name) = self.nodes.keys().find(|name| !edges.contains_key(*name)) {
            return Err(SleuthError::Graph(format!("Node '{}' has no outgoing edge", name)));
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            edges,
            recursion_limit: self.recursion_limit,
        })
    }
}

impl<S: Send + 'static> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a completed graph run.
#[derive(Debug)]
pub struct GraphRun<S> {
    /// Final state.
    pub state: S,
    /// Names of the nodes executed, in order.
    pub path: Vec<String>,
}

/// A validated, executable state graph.
pub struct CompiledGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    recursion_limit: usize,
}

impl<S: Send + 'static> CompiledGraph<S> {
    /// Run the graph and return the final state.
    pub async fn invoke(&self, state: S) -> Result<S> {
        Ok(self.run(state).await?.state)
    }

    /// Run the graph from START until END.
    #[instrument(skip_all, fields(recursion_limit = self.recursion_limit))]
    pub async fn run(&self, mut state: S) -> Result<GraphRun<S>> {
        let mut path = Vec::new();
        let mut current = self.next(START, &state)?;

        while current != END {
            if path.len() >= self.recursion_limit {
                return Err(SleuthError::RecursionLimit(self.recursion_limit));
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| {
                    SleuthError::Graph(format!("Routed to unknown node '{}'", current))
                })?;

            debug!("Running node '{}'", current);
            state = node.run(state).await?;
            path.push(current.clone());

            current = self.next(&current, &state)?;
        }

        Ok(GraphRun { state, path })
    }

    fn next(&self, from: &str, state: &S) -> Result<String> {
        match self.edges.get(from) {
            Some(Edge::Fixed(to)) => Ok(to.clone()),
            Some(Edge::Conditional(router)) => Ok(router(state)),
            None => Err(SleuthError::Graph(format!("Node '{}' has no outgoing edge", from))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Increment;

    #[async_trait]
    impl Node<u32> for Increment {
        async fn run(&self, state: u32) -> Result<u32> {
            Ok(state + 1)
        }
    }

    struct Fail;

    #[async_trait]
    impl Node<u32> for Fail {
        async fn run(&self, _state: u32) -> Result<u32> {
            Err(SleuthError::Tool("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_linear_graph() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", Increment)
            .add_node("b", Increment)
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END);

        let run = graph.compile().unwrap().run(0).await.unwrap();
        assert_eq!(run.state, 2);
        assert_eq!(run.path, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_conditional_loop_until_end() {
        let mut graph = StateGraph::new();
        graph
            .add_node("count", Increment)
            .add_edge(START, "count")
            .add_conditional_edges("count", |n: &u32| {
                if *n < 5 {
                    "count".to_string()
                } else {
                    END.to_string()
                }
            });

        assert_eq!(graph.compile().unwrap().invoke(0).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_recursion_limit() {
        let mut graph = StateGraph::new();
        graph
            .add_node("spin", Increment)
            .add_edge(START, "spin")
            .add_conditional_edges("spin", |_: &u32| "spin".to_string())
            .with_recursion_limit(3);

        let err = graph.compile().unwrap().invoke(0).await.unwrap_err();
        assert!(matches!(err, SleuthError::RecursionLimit(3)));
    }

    #[tokio::test]
    async fn test_node_error_propagates() {
        let mut graph = StateGraph::new();
        graph.add_node("fail", Fail).add_edge(START, "fail").add_edge("fail", END);

        let err = graph.compile().unwrap().invoke(0).await.unwrap_err();
        assert!(matches!(err, SleuthError::Tool(_)));
    }

    #[tokio::test]
    async fn test_router_to_unknown_node() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", Increment)
            .add_edge(START, "a")
            .add_conditional_edges("a", |_: &u32| "missing".to_string());

        let err = graph.compile().unwrap().invoke(0).await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_compile_rejects_bad_topology() {
        let mut no_entry: StateGraph<u32> = StateGraph::new();
        no_entry.add_node("a", Increment).add_edge("a", END);
        assert!(no_entry.compile().is_err());

        let mut dangling: StateGraph<u32> = StateGraph::new();
        dangling.add_node("a", Increment).add_edge(START, "a").add_edge("a", "b");
        assert!(dangling.compile().is_err());

        let mut dead_end: StateGraph<u32> = StateGraph::new();
        dead_end.add_node("a", Increment).add_edge(START, "a");
        assert!(dead_end.compile().is_err());

        let mut doubled: StateGraph<u32> = StateGraph::new();
        doubled
            .add_node("a", Increment)
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_conditional_edges("a", |_: &u32| END.to_string());
        assert!(doubled.compile().is_err());
    }
}
