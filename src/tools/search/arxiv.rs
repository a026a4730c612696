//! arXiv search through the Atom export API.

use super::{truncate_chars, SearchDocument};
use crate::error::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, instrument};

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry>(.*?)</entry>").expect("Invalid regex"));
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").expect("Invalid regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// An entry of the arXiv feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: Option<DateTime<Utc>>,
}

impl ArxivEntry {
    /// Published date and authors, then the abstract cut to `doc_chars`.
    fn into_document(self, doc_chars: usize) -> SearchDocument {
        let mut content = String::new();
        if let Some(published) = self.published {
            content.push_str(&format!("Published: {}\n", published.format("%Y-%m-%d")));
        }
        if !self.authors.is_empty() {
            content.push_str(&format!("Authors: {}\n", self.authors.join(", ")));
        }
        content.push_str(&truncate_chars(&self.summary, doc_chars));

        SearchDocument {
            source: self.id,
            page: Some(self.title),
            content,
        }
    }
}

/// arXiv search client.
pub struct ArxivClient {
    http: reqwest::Client,
    api_url: String,
    max_docs: usize,
    doc_chars: usize,
}

impl ArxivClient {
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

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchDocument>> {
        let max_results = self.max_docs.to_string();
        let body = self
            .http
            .get(&self.api_url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let entries = parse_feed(&body);
        debug!("arXiv returned {} entr(ies)", entries.len());

        Ok(entries
            .into_iter()
            .take(self.max_docs)
            .map(|entry| entry.into_document(self.doc_chars))
            .collect())
    }
}

/// Extract entries from an arXiv Atom feed.
pub fn parse_feed(xml: &str) -> Vec<ArxivEntry> {
    ENTRY_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            let id = tag_text(body, "id")?;
            Some(ArxivEntry {
                id,
                title: tag_text(body, "title").unwrap_or_default(),
                summary: tag_text(body, "summary").unwrap_or_default(),
                authors: AUTHOR_RE
                    .captures_iter(body)
                    .filter_map(|c| c.get(1).map(|m| clean_text(m.as_str())))
                    .collect(),
                published: tag_text(body, "published")
                    .and_then(|p| DateTime::parse_from_rfc3339(&p).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
            })
        })
        .collect()
}

/// Text of the first `<tag>` element directly inside `body`.
fn tag_text(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find(&open) {
        let start = search_from + offset;
        let after_name = start + open.len();
        // Skip longer names sharing the prefix, e.g. <id> vs <idx>.
        match body[after_name..].chars().next() {
            Some('>') | Some(' ') | Some('\n') | Some('\t') => {}
            _ => {
                search_from = after_name;
                continue;
            }
        }
        let content_start = after_name + body[after_name..].find('>')? + 1;
        let content_end = content_start + body[content_start..].find(&close)?;
        return Some(clean_text(&body[content_start..content_end]));
    }
    None
}

fn clean_text(raw: &str) -> String {
    let unescaped = raw
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(unescaped.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:attention</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on
      complex recurrent &amp; convolutional networks.
    </summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <published>2021-01-01T00:00:00Z</published>
    <title>Second</title>
    <summary>Short.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let entries = parse_feed(FEED);
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.id, "http://arxiv.org/abs/1706.03762v7");
        assert_eq!(first.title, "Attention Is All You Need");
        assert_eq!(
            first.summary,
            "The dominant sequence transduction models are based on complex recurrent & convolutional networks."
        );
        assert_eq!(first.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(
            first.published.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2017-06-12".to_string())
        );
        assert!(entries[1].authors.is_empty());
    }

    #[test]
    fn test_entry_document_truncates_only_the_summary() {
        let entry = parse_feed(FEED).remove(0);
        let doc = entry.into_document(20);
        assert_eq!(doc.page.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(
            doc.content,
            "Published: 2017-06-12\nAuthors: Ashish Vaswani, Noam Shazeer\nThe dominant sequenc"
        );
    }

    #[test]
    fn test_empty_feed() {
        assert!(parse_feed("<feed></feed>").is_empty());
    }
}
