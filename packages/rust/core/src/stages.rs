//! The four pipeline stages.
//!
//! Each stage performs exactly one collaborator call and adds exactly one
//! field to the run state. Only the web search stage absorbs failures; the
//! others propagate them and end the run.

use std::sync::Arc;

use analyst_llm::CompletionModel;
use analyst_search::WebSearch;
use analyst_shared::Result;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::prompts::PromptTemplate;
use crate::retrieval::NearestNeighbors;
use crate::state::{PipelineState, Retrieved, Searched, Seeded, Synthesized, WebStatus};

/// Stored in `web_results` when the search results carry no content.
pub const NO_WEB_RESULTS: &str = "No relevant web data found.";

/// Prefix of `web_results` when the search call fails.
pub const WEB_ERROR_PREFIX: &str = "Error fetching web data: ";

/// Joins retrieved internal chunks.
pub const INTERNAL_SEPARATOR: &str = "\n\n";

/// One step of the pipeline: consumes the previous state, yields the next.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Short human-readable name, used for progress and logs.
    fn name(&self) -> &'static str;

    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}

// ---------------------------------------------------------------------------
// 1. External search
// ---------------------------------------------------------------------------

/// Queries the hosted search service. Never fails.
pub struct WebSearchStage {
    search: Arc<dyn WebSearch>,
    max_results: u32,
}

impl WebSearchStage {
    pub fn new(search: Arc<dyn WebSearch>, max_results: u32) -> Self {
        Self {
            search,
            max_results,
        }
    }
}

#[async_trait]
impl Stage for WebSearchStage {
    type Input = Seeded;
    type Output = Searched;

    fn name(&self) -> &'static str {
        "Searching the web"
    }

    #[instrument(skip_all, fields(max_results = self.max_results))]
    async fn run(&self, input: Seeded) -> Result<Searched> {
        let outcome = self
            .search
            .search(input.query().as_str(), self.max_results)
            .await;

        let (web_results, status) = match outcome {
            Ok(response) => {
                let joined = response.joined_content();
                if joined.is_empty() {
                    debug!(hits = response.results.len(), "web search returned no content");
                    (NO_WEB_RESULTS.to_string(), WebStatus::Empty)
                } else {
                    debug!(hits = response.results.len(), "web search complete");
                    (joined, WebStatus::Found)
                }
            }
            Err(e) => {
                warn!(error = %e, "web search failed, continuing with degraded context");
                (format!("{WEB_ERROR_PREFIX}{e}"), WebStatus::Degraded)
            }
        };

        Ok(input.searched(web_results, status))
    }
}

// ---------------------------------------------------------------------------
// 2. Internal retrieval
// ---------------------------------------------------------------------------

/// Top-k lookup in the internal index.
pub struct InternalRetrievalStage {
    retriever: Arc<dyn NearestNeighbors>,
    top_k: usize,
}

impl InternalRetrievalStage {
    pub fn new(retriever: Arc<dyn NearestNeighbors>, top_k: usize) -> Self {
        Self { retriever, top_k }
    }
}

#[async_trait]
impl Stage for InternalRetrievalStage {
    type Input = Searched;
    type Output = Retrieved;

    fn name(&self) -> &'static str {
        "Retrieving internal documents"
    }

    #[instrument(skip_all, fields(top_k = self.top_k))]
    async fn run(&self, input: Searched) -> Result<Retrieved> {
        let chunks = self
            .retriever
            .search(input.query().as_str(), self.top_k)
            .await?;

        if chunks.is_empty() {
            debug!("internal index returned no documents");
        }

        let internal_docs = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(INTERNAL_SEPARATOR);

        Ok(input.retrieved(internal_docs))
    }
}

// ---------------------------------------------------------------------------
// 3. Insight synthesis
// ---------------------------------------------------------------------------

/// Summarises internal and web context into insights.
pub struct InsightStage {
    model: Arc<dyn CompletionModel>,
    prompt: PromptTemplate,
}

impl InsightStage {
    pub fn new(model: Arc<dyn CompletionModel>, prompt: PromptTemplate) -> Self {
        Self { model, prompt }
    }
}

#[async_trait]
impl Stage for InsightStage {
    type Input = Retrieved;
    type Output = Synthesized;

    fn name(&self) -> &'static str {
        "Synthesizing insights"
    }

    #[instrument(skip_all, fields(model = %self.model.model_id()))]
    async fn run(&self, input: Retrieved) -> Result<Synthesized> {
        let prompt = self.prompt.render(&[
            ("internal", input.internal_docs()),
            ("web", input.web_results()),
        ])?;
        let completion = self.model.complete(&prompt).await?;
        debug!(
            tokens_in = completion.tokens_in,
            tokens_out = completion.tokens_out,
            "insights generated"
        );
        Ok(input.synthesized(completion.text))
    }
}

// ---------------------------------------------------------------------------
// 4. SWOT report
// ---------------------------------------------------------------------------

/// Formats insights into a SWOT report.
pub struct SwotStage {
    model: Arc<dyn CompletionModel>,
    prompt: PromptTemplate,
}

impl SwotStage {
    pub fn new(model: Arc<dyn CompletionModel>, prompt: PromptTemplate) -> Self {
        Self { model, prompt }
    }
}

#[async_trait]
impl Stage for SwotStage {
    type Input = Synthesized;
    type Output = PipelineState;

    fn name(&self) -> &'static str {
        "Generating SWOT report"
    }

    #[instrument(skip_all, fields(model = %self.model.model_id()))]
    async fn run(&self, input: Synthesized) -> Result<PipelineState> {
        let prompt = self.prompt.render(&[("insights", input.insights())])?;
        let completion = self.model.complete(&prompt).await?;
        debug!(
            tokens_in = completion.tokens_in,
            tokens_out = completion.tokens_out,
            "swot report generated"
        );
        Ok(input.reported(completion.text))
    }
}
