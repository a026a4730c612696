//! Search tools: Wikipedia, Tavily web search and arXiv.
//!
//! All three render their hits as `<Document>` blocks separated by `---`
//! so the model sees one uniform format.

mod arxiv;
mod tavily;
mod wikipedia;

pub use arxiv::{parse_feed, ArxivClient};
pub use tavily::{parse_response, TavilyClient, TAVILY_API_KEY_ENV};
pub use wikipedia::{page_url, WikipediaClient};

/// Separator placed between formatted documents.
pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

/// A single search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    /// URL of the hit.
    pub source: String,
    /// Page or paper title, when the backend has one.
    pub page: Option<String>,
    /// Text shown to the model.
    pub content: String,
}

impl SearchDocument {
    /// Render as a `<Document>` block.
    pub fn render(&self) -> String {
        match &self.page {
            Some(page) => format!(
                "<Document source=\"{}\" page=\"{}\"/>\n{}\n</Document>",
                self.source, page, self.content
            ),
            None => format!(
                "<Document source=\"{}\" />\n{}\n</Document>",
                self.source, self.content
            ),
        }
    }
}

/// Join rendered documents.
pub fn format_documents(docs: &[SearchDocument]) -> String {
    docs.iter()
        .map(SearchDocument::render)
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Keep at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_and_without_page() {
        let doc = SearchDocument {
            source: "https://en.wikipedia.org/wiki/Rust".to_string(),
            page: Some("Rust".to_string()),
            content: "Iron oxide.".to_string(),
        };
        assert_eq!(
            doc.render(),
            "<Document source=\"https://en.wikipedia.org/wiki/Rust\" page=\"Rust\"/>\nIron oxide.\n</Document>"
        );

        let web = SearchDocument {
            source: "https://example.com".to_string(),
            page: None,
            content: "Example".to_string(),
        };
        assert_eq!(
            web.render(),
            "<Document source=\"https://example.com\" />\nExample\n</Document>"
        );
    }

    #[test]
    fn test_format_documents_joins_with_separator() {
        let docs = vec![
            SearchDocument {
                source: "a".to_string(),
                page: None,
                content: "one".to_string(),
            },
            SearchDocument {
                source: "b".to_string(),
                page: None,
                content: "two".to_string(),
            },
        ];
        let formatted = format_documents(&docs);
        assert_eq!(formatted.matches(DOCUMENT_SEPARATOR).count(), 1);
        assert!(formatted.starts_with("<Document source=\"a\""));
    }

    #[test]
    fn test_truncate_chars_is_unicode_safe() {
        assert_eq!(truncate_chars("añb", 2), "añ");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
