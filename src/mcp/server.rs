//! MCP server implementation.

use super::protocol::*;
use super::tools::{get_tools, ASK_TOOL};
use crate::agent::{format_question, Agent};
use crate::config::{Provider, Settings};
use crate::tools::{parse_tool_args, ToolContext};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "sleuth";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Sleuth.
pub struct McpServer {
    settings: Settings,
    tools: Option<ToolContext>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            tools: None,
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        // Logs go to stderr so they don't interfere with JSON-RPC
        info!("Sleuth MCP server starting");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }

        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle one line of input. Returns `None` for notifications.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                Some(JsonRpcResponse::error(None, codes::PARSE_ERROR, "Parse error"))
            }
        }
    }

    /// Handle a single JSON-RPC request.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("MCP request: {}", request.method);

        if request.is_notification() {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                codes::METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Handle initialize request.
    fn handle_initialize(&mut self, id: Option<Value>) -> JsonRpcResponse {
        match ToolContext::new(&self.settings) {
            Ok(tools) => {
                self.tools = Some(tools);
                debug!("Tool context initialized");
            }
            Err(e) => {
                warn!("Failed to initialize tools: {}", e);
                return JsonRpcResponse::error(id, -32000, &format!("Init failed: {}", e));
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        to_response(id, &result)
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        to_response(id, &ToolsListResult { tools: get_tools() })
    }

    /// Handle tools/call request.
    async fn handle_tools_call(
        &mut self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        codes::INVALID_PARAMS,
                        &format!("Invalid params: {}", e),
                    )
                }
            },
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let result = if params.name == ASK_TOOL {
            self.tool_ask(&arguments).await
        } else {
            self.tool_call(&params.name, &arguments).await
        };

        to_response(id, &result)
    }

    /// Run a single agent tool.
    async fn tool_call(&mut self, name: &str, arguments: &Value) -> ToolCallResult {
        let call = match parse_tool_args(name, arguments) {
            Ok(call) => call,
            Err(e) => return ToolCallResult::error(e.to_string()),
        };

        if self.tools.is_none() {
            match ToolContext::new(&self.settings) {
                Ok(tools) => self.tools = Some(tools),
                Err(e) => return ToolCallResult::error(format!("Init failed: {}", e)),
            }
        }
        let Some(tools) = &self.tools else {
            return ToolCallResult::error("Server not initialized".to_string());
        };

        match tools.execute(&call).await {
            Ok(output) => ToolCallResult::text(output),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    /// Ask tool: a full agent run.
    async fn tool_ask(&self, args: &Value) -> ToolCallResult {
        let question = match args.get("question").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolCallResult::error("Missing 'question' argument".to_string()),
        };

        let provider = match args.get("provider").and_then(|v| v.as_str()) {
            Some(p) => match p.parse::<Provider>() {
                Ok(provider) => provider,
                Err(e) => return ToolCallResult::error(e.to_string()),
            },
            None => self.settings.agent.provider,
        };

        let question = format_question(
            question,
            args.get("task_id").and_then(|v| v.as_str()),
            args.get("file_name").and_then(|v| v.as_str()),
        );

        let agent = match Agent::new(provider, &self.settings, None) {
            Ok(agent) => agent,
            Err(e) => return ToolCallResult::error(format!("Agent setup failed: {}", e)),
        };

        match agent.run(&question).await {
            Ok(response) => ToolCallResult::text(response.content),
            Err(e) => ToolCallResult::error(format!("Agent run failed: {}", e)),
        }
    }
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, -32603, &format!("Internal error: {}", e)),
    }
}
