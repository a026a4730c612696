//! Error types for Sleuth.

use thiserror::Error;

/// Library-level error type for Sleuth operations.
#[derive(Error, Debug)]
pub enum SleuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid provider '{0}'. Choose 'google' or 'groq'.")]
    Provider(String),

    #[error("Model error: {0}")]
    Llm(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Recursion limit of {0} reached without hitting a stop condition")]
    RecursionLimit(usize),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Media analysis failed: {0}")]
    Media(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI-compatible API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),
}

/// Result type alias for Sleuth operations.
pub type Result<T> = std::result::Result<T, SleuthError>;
