//! Route handlers.

pub mod analyze;
pub mod report;

use analyst_shared::AnalystError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Message returned for any failure that is not the caller's fault.
pub const GENERIC_FAILURE: &str = "SWOT analysis failed. Please try again later.";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler error rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AnalystError> for ApiError {
    fn from(e: AnalystError) -> Self {
        if e.is_client_error() {
            Self::new(StatusCode::BAD_REQUEST, e.to_string())
        } else {
            tracing::error!(error = %e, "request failed");
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use analyst_core::{NearestNeighbors, PipelineSettings, SwotPipeline};
    use analyst_llm::{Completion, CompletionModel};
    use analyst_search::{SearchResponse, WebSearch};
    use analyst_shared::{AnalystError, Result, RetrievedChunk};
    use async_trait::async_trait;
    use axum::{Router, body::Body, http::Request};

    use crate::{AppState, create_router};

    struct NoWeb;

    #[async_trait]
    impl WebSearch for NoWeb {
        async fn search(&self, _query: &str, _max_results: u32) -> Result<SearchResponse> {
            Err(AnalystError::Network("offline".into()))
        }
    }

    struct OneDoc {
        fail: bool,
    }

    #[async_trait]
    impl NearestNeighbors for OneDoc {
        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievedChunk>> {
            if self.fail {
                return Err(AnalystError::Retrieval("index missing".into()));
            }
            Ok(vec![RetrievedChunk {
                text: "internal note".into(),
                source: "notes.txt".into(),
                score: 0.9,
            }])
        }
    }

    struct Scripted(Mutex<VecDeque<&'static str>>);

    #[async_trait]
    impl CompletionModel for Scripted {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<Completion> {
            let text = self.0.lock().unwrap().pop_front().unwrap_or_default();
            Ok(Completion {
                text: text.into(),
                model: "scripted".into(),
                tokens_in: 0,
                tokens_out: 0,
                latency_ms: 0,
            })
        }
    }

    /// Router whose model answers "insights" and then `report`.
    pub fn app(report: &'static str) -> Router {
        build(report, false)
    }

    /// Router whose index always fails.
    pub fn broken_app() -> Router {
        build("", true)
    }

    fn build(report: &'static str, fail_index: bool) -> Router {
        let model = Scripted(Mutex::new(VecDeque::from(["insights", report])));
        let pipeline = SwotPipeline::new(
            Arc::new(NoWeb),
            Arc::new(OneDoc { fail: fail_index }),
            Arc::new(model),
            PipelineSettings::default(),
        );
        create_router(AppState::new(Arc::new(pipeline)))
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }
}
