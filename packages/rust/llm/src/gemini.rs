//! Generative Language API client (completions + embeddings).

use std::time::{Duration, Instant};

use analyst_shared::{AnalystError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{Completion, CompletionModel, Embedder};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("MarketAnalyst/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for `models/{model}:generateContent` and `{model}:embedContent`.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    completion_model: String,
    embedding_model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("completion_model", &self.completion_model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client. Model names may be given with or without the
    /// `models/` prefix.
    pub fn new(
        base_url: &Url,
        api_key: impl Into<String>,
        completion_model: &str,
        embedding_model: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AnalystError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            completion_model: bare_model_name(completion_model).to_string(),
            embedding_model: bare_model_name(embedding_model).to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.completion_model)
    }

    fn embed_url(&self) -> String {
        format!("{}/models/{}:embedContent", self.base_url, self.embedding_model)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AnalystError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AnalystError::Network(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            let preview: String = text.chars().take(200).collect();
            return Err(AnalystError::Completion(format!("HTTP {status}: {preview}")));
        }

        Ok(text)
    }
}

/// Strip an optional `models/` prefix.
fn bare_model_name(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

#[async_trait::async_trait]
impl CompletionModel for GeminiClient {
    fn model_id(&self) -> &str {
        &self.completion_model
    }

    #[instrument(skip_all, fields(model = %self.completion_model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let start = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let body = self.post_json(&self.generate_url(), &request).await?;
        let response: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| AnalystError::Completion(format!("malformed completion response: {e}")))?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(AnalystError::Completion(format!("prompt blocked: {reason}")));
        }

        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| AnalystError::Completion("response contained no candidates".into()))?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if text.is_empty() {
            warn!(
                finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
                "candidate had no text"
            );
        }

        let usage = response.usage_metadata.unwrap_or_default();
        let latency_ms = start.elapsed().as_millis() as u64;

        debug!(
            tokens_in = usage.prompt_token_count,
            tokens_out = usage.candidates_token_count,
            latency_ms,
            "completion received"
        );

        Ok(Completion {
            text,
            model: self.completion_model.clone(),
            tokens_in: usage.prompt_token_count,
            tokens_out: usage.candidates_token_count,
            latency_ms,
        })
    }
}

#[async_trait::async_trait]
impl Embedder for GeminiClient {
    #[instrument(skip_all, fields(model = %self.embedding_model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = format!("models/{}", self.embedding_model);
        let request = EmbedRequest {
            model: &model,
            content: Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.to_string()),
                }],
            },
        };

        let body = self.post_json(&self.embed_url(), &request).await?;
        let response: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| AnalystError::Completion(format!("malformed embedding response: {e}")))?;

        if response.embedding.values.is_empty() {
            return Err(AnalystError::Completion("embedding response was empty".into()));
        }

        debug!(dim = response.embedding.values.len(), "generated embedding");
        Ok(response.embedding.values)
    }
}
