//! Web search through the Tavily API.

use super::SearchDocument;
use crate::config::lookup_api_key;
use crate::error::{Result, SleuthError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Environment variable holding the Tavily key.
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Tavily search client.
pub struct TavilyClient {
    http: reqwest::Client,
    api_url: String,
    max_results: usize,
}

impl TavilyClient {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, max_results: usize) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            max_results,
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchDocument>> {
        let api_key = lookup_api_key(&[TAVILY_API_KEY_ENV])
            .ok_or_else(|| SleuthError::MissingApiKey(TAVILY_API_KEY_ENV.to_string()))?;

        let request = TavilySearchRequest {
            api_key: &api_key,
            query,
            max_results: self.max_results,
            search_depth: "basic",
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SleuthError::Search(format!("Tavily API error {}: {}", status, body)));
        }

        let docs = parse_response(response.json().await?, self.max_results)?;
        debug!("Tavily returned {} result(s)", docs.len());
        Ok(docs)
    }
}

/// Parse a Tavily search response.
pub fn parse_response(value: serde_json::Value, max_results: usize) -> Result<Vec<SearchDocument>> {
    let response: TavilySearchResponse = serde_json::from_value(value)
        .map_err(|e| SleuthError::Search(format!("Unexpected Tavily response: {}", e)))?;

    Ok(response
        .results
        .into_iter()
        .take(max_results)
        .map(|r| SearchDocument {
            source: r.url,
            page: None,
            content: r.content,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response() {
        let value = json!({
            "query": "mercedes sosa albums",
            "answer": null,
            "results": [
                {"title": "Discography", "url": "https://example.com/a", "content": "Forty albums.", "score": 0.9},
                {"title": "Bio", "url": "https://example.com/b", "content": "Argentine singer.", "score": 0.8},
                {"title": "Extra", "url": "https://example.com/c", "content": "More.", "score": 0.1}
            ]
        });

        let docs = parse_response(value, 2).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "https://example.com/a");
        assert_eq!(docs[0].content, "Forty albums.");
        assert!(docs[0].page.is_none());
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_response(json!({"query": "x"}), 3).unwrap().is_empty());
    }
}
