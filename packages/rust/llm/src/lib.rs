//! Text-completion and embedding collaborators.
//!
//! The pipeline treats the language model as a black box: a rendered prompt
//! goes in, text comes out. Embeddings are used only by the internal index.
//! [`GeminiClient`] implements both seams against the Generative Language
//! REST API.

mod gemini;

use analyst_shared::Result;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiClient;

/// A completed text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text, verbatim.
    pub text: String,
    /// Model that produced the text.
    pub model: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub latency_ms: u64,
}

/// A hosted text-completion model.
#[async_trait::async_trait]
pub trait CompletionModel: Send + Sync {
    /// Identifier of the configured model.
    fn model_id(&self) -> &str;

    /// Complete a fully rendered prompt. No retries.
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}

/// A text embedding function.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text` into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
