//! Core pipeline orchestration for the market analyst.
//!
//! This crate wires the collaborators (web search, nearest-neighbor
//! retrieval, text completion) into the fixed four-stage SWOT pipeline, and
//! drives the offline ingest flow that builds the internal index.

pub mod ingest;
pub mod pipeline;
pub mod prompts;
pub mod retrieval;
pub mod stages;
pub mod state;

#[cfg(test)]
mod testing;

pub use ingest::{IngestProgress, IngestSummary, ingest_documents};
pub use pipeline::{PipelineSettings, ProgressReporter, SilentProgress, SwotPipeline};
pub use prompts::{INSIGHT_PROMPT, PromptTemplate, SWOT_PROMPT};
pub use retrieval::{IndexRetriever, NearestNeighbors};
pub use stages::{
    INTERNAL_SEPARATOR, InsightStage, InternalRetrievalStage, NO_WEB_RESULTS, Stage, SwotStage,
    WEB_ERROR_PREFIX, WebSearchStage,
};
pub use state::{PipelineState, Query, Retrieved, Searched, Seeded, Synthesized, WebStatus};
