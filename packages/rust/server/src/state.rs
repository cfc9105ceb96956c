//! Application state.

use std::sync::Arc;

use analyst_core::SwotPipeline;

/// Shared across handlers. Each request gets its own pipeline run.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SwotPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<SwotPipeline>) -> Self {
        Self { pipeline }
    }
}
