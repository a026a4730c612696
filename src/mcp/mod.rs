//! MCP (Model Context Protocol) server for Sleuth.
//!
//! Exposes the agent's tools, and the agent itself, to MCP clients.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
