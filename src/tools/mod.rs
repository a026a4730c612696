//! Tool definitions and implementations for the agent.
//!
//! Every tool has a JSON-schema contract that is advertised to the model,
//! a [`ToolCall`] variant produced by [`parse_tool_call`], and an
//! implementation reached through [`ToolContext::execute`].
//!
//! Error policy: `download_file_of_task_id` and `analyze_audio_file` report
//! failures as their result text; every other tool returns `Err`, which the
//! agent's tools node turns into an error message for the model.

pub mod download;
pub mod math;
pub mod media;
pub mod search;

use crate::config::Settings;
use crate::error::{Result, SleuthError};
use media::GeminiClient;
use search::{format_documents, ArxivClient, TavilyClient, WikipediaClient};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Name and argument schema of a tool, as advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Multiply { a: i64, b: i64 },
    Add { a: i64, b: i64 },
    Subtract { a: i64, b: i64 },
    Divide { a: i64, b: i64 },
    Modulus { a: i64, b: i64 },
    WikiSearch { query: String },
    WebSearch { query: String },
    ArxivSearch { query: String },
    YoutubeAnalyze { question: String, url: String },
    ReverseString { s: String },
    AnalyzeAudioFile { path_file_audio: String, query: String },
    DownloadFileOfTaskId { task_id: String, file_name: String },
}

impl ToolCall {
    /// Tool name as advertised to the model.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::Multiply { .. } => "multiply",
            ToolCall::Add { .. } => "add",
            ToolCall::Subtract { .. } => "subtract",
            ToolCall::Divide { .. } => "divide",
            ToolCall::Modulus { .. } => "modulus",
            ToolCall::WikiSearch { .. } => "wiki_search",
            ToolCall::WebSearch { .. } => "web_search",
            ToolCall::ArxivSearch { .. } => "arxiv_search",
            ToolCall::YoutubeAnalyze { .. } => "youtube_analyze",
            ToolCall::ReverseString { .. } => "reverse_string",
            ToolCall::AnalyzeAudioFile { .. } => "analyze_audio_file",
            ToolCall::DownloadFileOfTaskId { .. } => "download_file_of_task_id",
        }
    }
}

fn two_ints() -> Value {
    json!({
        "type": "object",
        "properties": {
            "a": { "type": "integer", "description": "first int" },
            "b": { "type": "integer", "description": "second int" }
        },
        "required": ["a", "b"]
    })
}

fn query_only() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "The search query." }
        },
        "required": ["query"]
    })
}

/// Definitions of every tool, in the order they are offered to the model.
pub fn tool_definitions() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "multiply",
            description: "Multiply two numbers.",
            parameters: two_ints(),
        },
        ToolSpec {
            name: "add",
            description: "Add two numbers.",
            parameters: two_ints(),
        },
        ToolSpec {
            name: "subtract",
            description: "Subtract two numbers.",
            parameters: two_ints(),
        },
        ToolSpec {
            name: "divide",
            description: "Divide two numbers.",
            parameters: two_ints(),
        },
        ToolSpec {
            name: "modulus",
            description: "Get the modulus of two numbers.",
            parameters: two_ints(),
        },
        ToolSpec {
            name: "wiki_search",
            description: "Search Wikipedia for a query and return maximum 2 results. \
                Returns formatted search results or a message if no results are found.",
            parameters: query_only(),
        },
        ToolSpec {
            name: "web_search",
            description: "Search Tavily for a query and return maximum 3 results. \
                Returns formatted search results or a message if no results are found.",
            parameters: query_only(),
        },
        ToolSpec {
            name: "arxiv_search",
            description: "Search Arxiv for a query and return maximum 3 results.",
            parameters: query_only(),
        },
        ToolSpec {
            name: "youtube_analyze",
            description: "Given a question and YouTube URL, analyze the video to answer the question.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "Question about a YouTube video" },
                    "url": { "type": "string", "description": "The YouTube URL" }
                },
                "required": ["question", "url"]
            }),
        },
        ToolSpec {
            name: "reverse_string",
            description: "Reverse a given string.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "s": { "type": "string", "description": "The string to reverse." }
                },
                "required": ["s"]
            }),
        },
        ToolSpec {
            name: "analyze_audio_file",
            description: "Analyzes an MP3 audio file to answer a specific query. \
                Returns the result of the analysis of the audio.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "path_file_audio": { "type": "string", "description": "Path to the MP3 audio file to be analyzed." },
                    "query": { "type": "string", "description": "Question or query to analyze the content of the audio file." }
                },
                "required": ["path_file_audio", "query"]
            }),
        },
        ToolSpec {
            name: "download_file_of_task_id",
            description: "Download a file associated with a specific task ID and save it to a temporary location. \
                Returns the path to the downloaded file or an error message if the download fails.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string", "description": "The unique identifier of the task associated with the file to download." },
                    "file_name": { "type": "string", "description": "The name to assign to the downloaded file." }
                },
                "required": ["task_id", "file_name"]
            }),
        },
    ]
}

/// Parse a tool call from the model's name and raw JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: Value = if arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| SleuthError::Tool(format!("Invalid tool arguments: {}", e)))?
    };
    parse_tool_args(name, &args)
}

/// Build a tool call from already decoded arguments.
pub fn parse_tool_args(name: &str, args: &Value) -> Result<ToolCall> {
    if !args.is_object() {
        return Err(SleuthError::Tool(format!(
            "Arguments for '{}' must be a JSON object",
            name
        )));
    }

    match name {
        "multiply" => Ok(ToolCall::Multiply {
            a: int_arg(args, "a")?,
            b: int_arg(args, "b")?,
        }),
        "add" => Ok(ToolCall::Add {
            a: int_arg(args, "a")?,
            b: int_arg(args, "b")?,
        }),
        "subtract" => Ok(ToolCall::Subtract {
            a: int_arg(args, "a")?,
            b: int_arg(args, "b")?,
        }),
        "divide" => Ok(ToolCall::Divide {
            a: int_arg(args, "a")?,
            b: int_arg(args, "b")?,
        }),
        "modulus" => Ok(ToolCall::Modulus {
            a: int_arg(args, "a")?,
            b: int_arg(args, "b")?,
        }),
        "wiki_search" => Ok(ToolCall::WikiSearch {
            query: str_arg(args, "query")?,
        }),
        "web_search" => Ok(ToolCall::WebSearch {
            query: str_arg(args, "query")?,
        }),
        "arxiv_search" | "arvix_search" => Ok(ToolCall::ArxivSearch {
            query: str_arg(args, "query")?,
        }),
        "youtube_analyze" => Ok(ToolCall::YoutubeAnalyze {
            question: str_arg(args, "question")?,
            url: str_arg(args, "url")?,
        }),
        "reverse_string" => Ok(ToolCall::ReverseString {
            s: str_arg(args, "s")?,
        }),
        "analyze_audio_file" => Ok(ToolCall::AnalyzeAudioFile {
            path_file_audio: str_arg(args, "path_file_audio")?,
            query: str_arg(args, "query")?,
        }),
        "download_file_of_task_id" => Ok(ToolCall::DownloadFileOfTaskId {
            task_id: str_arg(args, "task_id")?,
            file_name: str_arg(args, "file_name")?,
        }),
        _ => Err(SleuthError::UnknownTool(name.to_string())),
    }
}

fn str_arg(args: &Value, key: &str) -> Result<String> {
    args[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SleuthError::Tool(format!("Missing '{}' argument", key)))
}

/// Integers may arrive as JSON integers, integral floats, or numeric strings.
fn int_arg(args: &Value, key: &str) -> Result<i64> {
    let value = &args[key];
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.2e18)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match (value, parsed) {
        (Value::Null, _) => Err(SleuthError::Tool(format!("Missing '{}' argument", key))),
        (_, Some(n)) => Ok(n),
        (other, None) => Err(SleuthError::Tool(format!(
            "Argument '{}' must be an integer, got {}",
            key, other
        ))),
    }
}

/// Tool execution context: shared HTTP client, search backends and settings.
pub struct ToolContext {
    http: reqwest::Client,
    settings: Settings,
    wikipedia: WikipediaClient,
    tavily: TavilyClient,
    arxiv: ArxivClient,
}

impl ToolContext {
    /// Create a tool context from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.tools.http_timeout_secs))
            .user_agent(concat!("sleuth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tools = &settings.tools;
        Ok(Self {
            wikipedia: WikipediaClient::new(
                http.clone(),
                &tools.wikipedia_api_url,
                tools.wiki_max_docs,
                tools.wiki_doc_chars,
            ),
            tavily: TavilyClient::new(http.clone(), &tools.tavily_api_url, tools.web_max_results),
            arxiv: ArxivClient::new(
                http.clone(),
                &tools.arxiv_api_url,
                tools.arxiv_max_docs,
                tools.arxiv_doc_chars,
            ),
            http,
            settings: settings.clone(),
        })
    }

    /// Directory task attachments are downloaded to.
    pub fn download_dir(&self) -> PathBuf {
        self.settings.temp_dir()
    }

    /// Execute a tool call and return its textual result.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        info!("Executing tool {}", tool.name());

        match tool {
            ToolCall::Multiply { a, b } => Ok(math::multiply(*a, *b)?.to_string()),
            ToolCall::Add { a, b } => Ok(math::add(*a, *b)?.to_string()),
            ToolCall::Subtract { a, b } => Ok(math::subtract(*a, *b)?.to_string()),
            ToolCall::Divide { a, b } => Ok(math::format_float(math::divide(*a, *b)?)),
            ToolCall::Modulus { a, b } => Ok(math::modulus(*a, *b)?.to_string()),
            ToolCall::ReverseString { s } => Ok(math::reverse_string(s)),
            ToolCall::WikiSearch { query } => {
                let docs = self.wikipedia.search(query).await?;
                if docs.is_empty() {
                    return Ok(format!("No Wikipedia articles found for query: {}", query));
                }
                Ok(format_documents(&docs))
            }
            ToolCall::WebSearch { query } => {
                let docs = self.tavily.search(query).await?;
                if docs.is_empty() {
                    return Ok(format!("No web search results found for query: {}", query));
                }
                Ok(format_documents(&docs))
            }
            ToolCall::ArxivSearch { query } => {
                let docs = self.arxiv.search(query).await?;
                if docs.is_empty() {
                    return Ok(format!("No arXiv articles found for query: {}", query));
                }
                Ok(format_documents(&docs))
            }
            ToolCall::YoutubeAnalyze { question, url } => self
                .execute_youtube_analyze(question, url)
                .await
                .map_err(|e| SleuthError::Processing(e.to_string())),
            ToolCall::AnalyzeAudioFile {
                path_file_audio,
                query,
            } => Ok(self.execute_analyze_audio(path_file_audio, query).await),
            ToolCall::DownloadFileOfTaskId { task_id, file_name } => {
                Ok(self.execute_download(task_id, file_name).await)
            }
        }
    }

    async fn execute_youtube_analyze(&self, question: &str, url: &str) -> Result<String> {
        let settings = &self.settings.tools.gemini;
        let gemini = GeminiClient::from_settings(self.http.clone(), settings)?;
        media::youtube_analyze(&gemini, &settings.video_model, question, url).await
    }

    async fn execute_analyze_audio(&self, path_file_audio: &str, query: &str) -> String {
        info!("Analyzing audio file {} with query: {}", path_file_audio, query);

        let settings = &self.settings.tools.gemini;
        let result = async {
            let gemini = GeminiClient::from_settings(self.http.clone(), settings)?;
            media::analyze_audio(&gemini, &settings.audio_model, Path::new(path_file_audio), query)
                .await
        }
        .await;

        match result {
            Ok(text) => text,
            Err(e) => {
                warn!("Error analyzing audio file: {}", e);
                format!("Error analyzing audio file: {}", e)
            }
        }
    }

    async fn execute_download(&self, task_id: &str, file_name: &str) -> String {
        let result = download::download_task_file(
            &self.http,
            &self.settings.tools.scoring_api_url,
            task_id,
            file_name,
            &self.download_dir(),
        )
        .await;

        match result {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(e) => {
                warn!("Error downloading file: {}", e);
                format!("Error downloading file: {}", e)
            }
        }
    }
}
