//! Wikipedia search through the MediaWiki action API.

use super::{truncate_chars, SearchDocument};
use crate::error::{Result, SleuthError};
use serde::Deserialize;
use tracing::{debug, instrument};

const WIKI_BASE_URL: &str = "https://en.wikipedia.org/wiki/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// Wikipedia search client.
pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
    max_docs: usize,
    doc_chars: usize,
}

impl WikipediaClient {
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        max_docs: usize,
        doc_chars: usize,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            max_docs,
            doc_chars,
        }
    }

    /// Search and load the plain-text content of the top articles.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchDocument>> {
        let limit = self.max_docs.to_string();
        let response: SearchResponse = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let titles: Vec<String> = response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default();

        debug!("Wikipedia returned {} title(s)", titles.len());

        let pages =
            futures::future::try_join_all(titles.iter().map(|title| self.load_page(title))).await?;

        Ok(pages.into_iter().flatten().take(self.max_docs).collect())
    }

    async fn load_page(&self, title: &str) -> Result<Option<SearchDocument>> {
        let response: serde_json::Value = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_page(response, self.doc_chars)
    }
}

/// Parse a `prop=extracts` response into a document.
pub(crate) fn parse_page(
    value: serde_json::Value,
    doc_chars: usize,
) -> Result<Option<SearchDocument>> {
    let response: PageResponse = serde_json::from_value(value)
        .map_err(|e| SleuthError::Search(format!("Unexpected Wikipedia response: {}", e)))?;

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().find(|p| !p.missing));

    Ok(page.map(|page| {
        let source = page.fullurl.unwrap_or_else(|| page_url(&page.title));
        SearchDocument {
            source,
            content: truncate_chars(page.extract.as_deref().unwrap_or_default().trim(), doc_chars),
            page: Some(page.title),
        }
    }))
}

/// Canonical article URL for a title.
pub fn page_url(title: &str) -> String {
    let slug = title.replace(' ', "_");
    match url::Url::parse(WIKI_BASE_URL).and_then(|base| base.join(&slug)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", WIKI_BASE_URL, slug),
    }
}
