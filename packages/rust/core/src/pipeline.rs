//! End-to-end SWOT pipeline: query → web search → internal retrieval →
//! insights → SWOT report.

use std::sync::Arc;
use std::time::Instant;

use analyst_llm::{CompletionModel, GeminiClient};
use analyst_search::{TavilyClient, WebSearch};
use analyst_shared::{AnalystConfig, Result};
use analyst_storage::Storage;
use tracing::{debug, error, info, instrument};

use crate::prompts::{INSIGHT_PROMPT, SWOT_PROMPT};
use crate::retrieval::{IndexRetriever, NearestNeighbors};
use crate::stages::{InsightStage, InternalRetrievalStage, Stage, SwotStage, WebSearchStage};
use crate::state::{PipelineState, Query, Seeded};

/// Tunables injected at construction.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Web results requested per run.
    pub max_results: u32,
    /// Internal chunks retrieved per run.
    pub top_k: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 3,
            top_k: 3,
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, state: &PipelineState);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _state: &PipelineState) {}
}

/// The fixed four-stage chain. Stateless between runs; share it behind an
/// `Arc` to serve concurrent requests.
pub struct SwotPipeline {
    web: WebSearchStage,
    internal: InternalRetrievalStage,
    insight: InsightStage,
    swot: SwotStage,
}

impl SwotPipeline {
    pub fn new(
        search: Arc<dyn WebSearch>,
        retriever: Arc<dyn NearestNeighbors>,
        model: Arc<dyn CompletionModel>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            web: WebSearchStage::new(search, settings.max_results),
            internal: InternalRetrievalStage::new(retriever, settings.top_k),
            insight: InsightStage::new(model.clone(), INSIGHT_PROMPT),
            swot: SwotStage::new(model, SWOT_PROMPT),
        }
    }

    /// Build the production collaborators from resolved configuration.
    ///
    /// The index is opened read-only and must already exist.
    pub async fn from_config(config: &AnalystConfig) -> Result<Self> {
        let search = TavilyClient::new(
            config.search_endpoint.clone(),
            config.search_api_key.clone(),
            None,
        )?;
        let gemini = Arc::new(GeminiClient::new(
            &config.llm_base_url,
            config.llm_api_key.clone(),
            &config.completion_model_id,
            &config.embedding_model_id,
            None,
        )?);
        let storage = Arc::new(Storage::open_readonly(&config.index_location).await?);
        let retriever = IndexRetriever::new(storage, gemini.clone());

        debug!(index = %config.index_location.display(), "pipeline collaborators ready");

        Ok(Self::new(
            Arc::new(search),
            Arc::new(retriever),
            gemini,
            PipelineSettings {
                max_results: config.search_max_results,
                top_k: config.top_k,
            },
        ))
    }

    /// Run all four stages in order.
    ///
    /// A web search failure is absorbed into `web_results`; any other
    /// stage failure ends the run and is returned.
    #[instrument(skip_all, fields(query = %query, run_id = tracing::field::Empty))]
    pub async fn run(
        &self,
        query: Query,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineState> {
        let start = Instant::now();
        let seeded = Seeded::new(query);
        tracing::Span::current().record("run_id", tracing::field::display(seeded.run_id()));

        info!("starting swot pipeline");

        let searched = run_stage(&self.web, seeded, progress).await?;
        let retrieved = run_stage(&self.internal, searched, progress).await?;
        let synthesized = run_stage(&self.insight, retrieved, progress).await?;
        let state = run_stage(&self.swot, synthesized, progress).await?;

        progress.done(&state);

        info!(
            web_status = %state.web_status(),
            internal_len = state.internal_docs().len(),
            report_len = state.swot_report().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "swot pipeline complete"
        );

        Ok(state)
    }
}

async fn run_stage<S: Stage>(
    stage: &S,
    input: S::Input,
    progress: &dyn ProgressReporter,
) -> Result<S::Output> {
    progress.phase(stage.name());
    let start = Instant::now();
    let result = stage.run(input).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => debug!(stage = stage.name(), elapsed_ms, "stage complete"),
        Err(e) => error!(stage = stage.name(), elapsed_ms, error = %e, "stage failed"),
    }
    result
}
