//! Audio and video analysis through the Gemini REST API.
//!
//! YouTube videos are passed to `generateContent` by URL. Local audio files
//! are first uploaded with the Files API resumable protocol and then
//! referenced by their file URI.

use crate::config::{lookup_api_key, GeminiSettings};
use crate::error::{Result, SleuthError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

/// Prompt prefix used for audio questions.
pub const AUDIO_PROMPT_PREFIX: &str =
    "Carefully analyze the audio to answer the question correctly.\n\n The question is ";

static YOUTUBE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:https?://)?
        (?:www\.|m\.)?
        (?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|v/|shorts/)|youtu\.be/)
        [a-zA-Z0-9_-]{11}
        ",
    )
    .expect("Invalid regex")
});

/// Whether `url` points at a YouTube video.
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL_RE.is_match(url.trim())
}

/// A content part of a Gemini request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn file(uri: impl Into<String>, mime_type: Option<String>) -> Self {
        Part::File {
            file_data: FileData {
                file_uri: uri.into(),
                mime_type,
            },
        }
    }
}

/// A file stored with the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Minimal Gemini REST client.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured environment variable.
    pub fn from_settings(http: reqwest::Client, settings: &GeminiSettings) -> Result<Self> {
        let names = [settings.api_key_env.as_str(), "GEMINI_API_KEY"];
        let api_key = lookup_api_key(&names)
            .ok_or_else(|| SleuthError::MissingApiKey(names.join(" or ")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Call `models/{model}:generateContent` and return the concatenated text.
    #[instrument(skip(self, parts), fields(parts = parts.len()))]
    pub async fn generate_content(&self, model: &str, parts: Vec<Part>) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = json!({ "contents": [{ "role": "user", "parts": parts }] });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SleuthError::Media(format!("Gemini API error {}: {}", status, text)));
        }

        extract_text(response.json().await?)
    }

    /// Upload a local file with the resumable upload protocol.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = guess_mime_type(path);
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        debug!("Starting upload of {} bytes as {}", bytes.len(), mime_type);

        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?
            .error_for_status()?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                SleuthError::Media("Upload session did not return an upload URL".to_string())
            })?
            .to_string();

        let response: UploadResponse = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Uploaded {} as {}", display_name, response.file.name);
        Ok(response.file)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(value: serde_json::Value) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_value(value)
        .map_err(|e| SleuthError::Media(format!("Unexpected Gemini response: {}", e)))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(SleuthError::Media(format!("Gemini returned no answer: {}", reason)));
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(text.trim().to_string())
}

/// MIME type for an audio file, by extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("aiff") | Some("aif") => "audio/aiff",
        _ => "audio/mpeg",
    }
}

/// Answer a question about a YouTube video.
pub async fn youtube_analyze(
    client: &GeminiClient,
    model: &str,
    question: &str,
    url: &str,
) -> Result<String> {
    if !is_youtube_url(url) {
        return Err(SleuthError::InvalidInput(format!("Not a YouTube URL: {}", url)));
    }

    client
        .generate_content(model, vec![Part::file(url.trim(), None), Part::text(question)])
        .await
}

/// Answer a question about a local audio file.
pub async fn analyze_audio(
    client: &GeminiClient,
    model: &str,
    path: &Path,
    query: &str,
) -> Result<String> {
    if !path.is_file() {
        return Err(SleuthError::InvalidInput(format!(
            "Audio file not found: {}",
            path.display()
        )));
    }

    let file = client.upload_file(path).await?;
    let mime_type = file
        .mime_type
        .clone()
        .unwrap_or_else(|| guess_mime_type(path).to_string());

    client
        .generate_content(
            model,
            vec![
                Part::text(format!("{}{}", AUDIO_PROMPT_PREFIX, query)),
                Part::file(file.uri, Some(mime_type)),
            ],
        )
        .await
}
