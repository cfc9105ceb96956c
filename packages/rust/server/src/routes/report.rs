//! `POST /report`: run the pipeline and return the paginated PDF.

use analyst_core::{Query, SilentProgress};
use analyst_report::ReportStatus;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::ApiError;
use super::analyze::AnalyzeRequest;
use crate::state::AppState;

pub async fn report(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Response, ApiError> {
    let query = Query::new(&req.query)?;
    let result = state.pipeline.run(query, &SilentProgress).await?;

    let sections = match analyst_report::assess(result.swot_report()) {
        ReportStatus::Structured(sections) => sections,
        other => {
            let message = other.message().unwrap_or(analyst_report::UNSTRUCTURED_REPORT_MESSAGE);
            tracing::warn!(run_id = %result.run_id(), reason = message, "report not renderable");
            return Err(ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, message));
        }
    };

    let rendered = analyst_report::render_pdf(&sections, result.query().as_str())?;
    let disposition = format!("attachment; filename=\"{}\"", rendered.filename);

    Ok((
        [
            (header::CONTENT_TYPE, rendered.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}
