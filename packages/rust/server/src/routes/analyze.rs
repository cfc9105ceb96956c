//! `POST /analyze`: run the pipeline and return the raw report.

use analyst_core::{Query, SilentProgress};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub swot_report: String,
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let query = Query::new(&req.query)?;
    let result = state.pipeline.run(query, &SilentProgress).await?;

    Ok(Json(AnalyzeResponse {
        swot_report: result.into_swot_report(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::routes::test_support::{app, body_bytes, broken_app, post_json};
    use crate::routes::GENERIC_FAILURE;

    #[tokio::test]
    async fn returns_swot_report() {
        let response = app("Strengths:\n- Fast")
            .oneshot(post_json("/analyze", serde_json::json!({"query": "EV market"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["swot_report"], "Strengths:\n- Fast");
    }

    #[tokio::test]
    async fn blank_query_is_bad_request() {
        let response = app("unused")
            .oneshot(post_json("/analyze", serde_json::json!({"query": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("query"));
    }

    #[tokio::test]
    async fn fatal_failure_is_generic_500() {
        let response = broken_app()
            .oneshot(post_json("/analyze", serde_json::json!({"query": "EV market"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"], GENERIC_FAILURE);
    }
}
