//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for agent runs and direct tool calls.

use super::resolve_provider;
use crate::agent::{format_question, Agent, ToolCallRecord};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SleuthError;
use crate::tools::{parse_tool_args, tool_definitions, ToolContext, ToolSpec};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    tools: ToolContext,
    settings: Settings,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let app = router(settings)?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Sleuth API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("List Tools", "GET  /tools");
    Output::kv("Ask", "POST /ask");
    Output::kv("Call Tool", "POST /tools/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router.
fn router(settings: Settings) -> anyhow::Result<Router> {
    let state = Arc::new(AppState {
        tools: ToolContext::new(&settings)?,
        settings,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .route("/ask", post(ask))
        .layer(cors)
        .with_state(state))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    content: String,
    tool_calls: Vec<ToolCallRecord>,
    steps: usize,
}

#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolSpec>,
}

#[derive(Serialize)]
struct ToolResultResponse {
    tool: String,
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools() -> impl IntoResponse {
    Json(ToolsResponse {
        tools: tool_definitions(),
    })
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Response {
    let call = match parse_tool_args(&name, &args) {
        Ok(call) => call,
        Err(e @ SleuthError::UnknownTool(_)) => return error_response(StatusCode::NOT_FOUND, e),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    match state.tools.execute(&call).await {
        Ok(result) => Json(ToolResultResponse {
            tool: call.name().to_string(),
            result,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let provider = match resolve_provider(req.provider.as_deref(), &state.settings) {
        Ok(provider) => provider,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let agent = match Agent::new(provider, &state.settings, req.model.as_deref()) {
        Ok(agent) => agent,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    let question = format_question(&req.question, req.task_id.as_deref(), req.file_name.as_deref());
    info!("API ask via {}", provider);

    match agent.run(&question).await {
        Ok(response) => Json(AskResponse {
            answer: response.final_answer().to_string(),
            content: response.content,
            tool_calls: response.tool_calls,
            steps: response.steps,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
