//! External web search collaborator.
//!
//! The pipeline's first stage asks a hosted search service for a handful of
//! results about the user's query. This crate defines the seam
//! ([`WebSearch`]), the validated result types, and a Tavily-compatible
//! HTTP client.

mod tavily;

use analyst_shared::Result;
use serde::{Deserialize, Serialize};

pub use tavily::TavilyClient;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One search hit. Only `content` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Extracted page content used as context.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Validated search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    /// Join every hit's content with a newline.
    pub fn joined_content(&self) -> String {
        self.results
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// A hosted web search service.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Search for `query`, asking for at most `max_results` hits.
    ///
    /// Transport failures, non-success statuses and malformed bodies are all
    /// returned as errors; implementations never panic on bad input.
    async fn search(&self, query: &str, max_results: u32) -> Result<SearchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(content: &str) -> SearchHit {
        SearchHit {
            content: content.into(),
            title: None,
            url: None,
            score: None,
        }
    }

    #[test]
    fn joined_content_uses_newlines() {
        let response = SearchResponse {
            results: vec![hit("first"), hit("second"), hit("third")],
        };
        assert_eq!(response.joined_content(), "first\nsecond\nthird");
    }

    #[test]
    fn joined_content_empty() {
        assert_eq!(SearchResponse::default().joined_content(), "");
    }
}
