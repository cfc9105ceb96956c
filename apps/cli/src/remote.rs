//! Client for a running `market-analyst serve` instance.

use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    swot_report: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// POST `query` to `{server}/analyze` and return the raw report.
pub(crate) async fn analyze_remote(server: &Url, query: &str) -> Result<String> {
    let endpoint = server
        .join("analyze")
        .map_err(|e| eyre!("invalid server URL '{server}': {e}"))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("MarketAnalyst/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(300))
        .build()?;

    let response = client
        .post(endpoint.clone())
        .json(&AnalyzeRequest { query })
        .send()
        .await
        .map_err(|e| eyre!("{endpoint}: {e}"))?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        return Err(eyre!("server returned {status}: {message}"));
    }

    let parsed: AnalyzeResponse = serde_json::from_str(&body)
        .map_err(|e| eyre!("unexpected response from {endpoint}: {e}"))?;
    Ok(parsed.swot_report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_report_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(serde_json::json!({"query": "EV market"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "swot_report": "Strengths:\n- Fast"
            })))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let report = analyze_remote(&url, "EV market").await.unwrap();
        assert_eq!(report, "Strengths:\n- Fast");
    }

    #[tokio::test]
    async fn surfaces_server_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "SWOT analysis failed. Please try again later."
            })))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let err = analyze_remote(&url, "EV market").await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Please try again later"));
    }
}
