//! Tavily-compatible search client.

use std::time::Duration;

use analyst_shared::{AnalystError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::{SearchHit, SearchResponse, WebSearch};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("MarketAnalyst/", env!("CARGO_PKG_VERSION"));

/// How much of an error body is echoed back in the error message.
const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
}

/// Response shape as sent by the service. A missing `results` key means
/// "nothing found"; a result without `content` is malformed.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// HTTP client for a Tavily-style `POST /search` endpoint.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl TavilyClient {
    /// Build a client. `timeout` bounds each request; `None` leaves latency
    /// bounding to the transport.
    pub fn new(endpoint: Url, api_key: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalystError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl WebSearch for TavilyClient {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, max_results = max_results))]
    async fn search(&self, query: &str, max_results: u32) -> Result<SearchResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalystError::Search("search API key is not configured".into()))?;

        debug!("sending search request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&SearchRequest { query, max_results })
            .send()
            .await
            .map_err(|e| AnalystError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview = &body[..floor_char_boundary(&body, ERROR_BODY_PREVIEW)];
            return Err(AnalystError::Search(format!("HTTP {status}: {preview}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalystError::Network(format!("failed to read search body: {e}")))?;

        let wire: WireResponse = serde_json::from_str(&body)
            .map_err(|e| AnalystError::Search(format!("malformed search response: {e}")))?;

        debug!(hits = wire.results.len(), "search response received");

        Ok(SearchResponse {
            results: wire.results,
        })
    }
}

/// Largest char boundary at or below `max`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
