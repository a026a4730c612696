//! Sleuth - a tool-calling research agent
//!
//! Sleuth answers questions with a chat model that can call a fixed set of
//! tools: integer arithmetic, string reversal, Wikipedia/web/arXiv search,
//! downloading task attachments, and Gemini-backed audio and YouTube analysis.
//!
//! # Architecture
//!
//! - `config` - Settings, provider selection and the system prompt
//! - `llm` - Chat messages and the `ChatModel` abstraction
//! - `graph` - A minimal state graph with conditional routing
//! - `tools` - Tool contracts, argument parsing and execution
//! - `agent` - The retriever/assistant/tools graph and the `Agent` facade
//! - `mcp` - MCP server exposing the tools
//! - `cli` - Command-line interface and HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use sleuth::agent::Agent;
//! use sleuth::config::{Provider, Settings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let agent = Agent::new(Provider::Google, &settings, None)?;
//!
//!     let response = agent.run("What is 6 times 7?").await?;
//!     println!("{}", response.final_answer());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod mcp;
pub mod openai;
pub mod tools;

pub use error::{Result, SleuthError};
