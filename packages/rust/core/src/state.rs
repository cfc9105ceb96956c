//! Per-run pipeline state.
//!
//! Each stage consumes the previous stage's value and returns a new one
//! carrying exactly one more field:
//!
//! ```text
//! Seeded { query } → Searched { +web_results } → Retrieved { +internal_docs }
//!   → Synthesized { +insights } → PipelineState { +swot_report }
//! ```
//!
//! Fields are private and the transitions are crate-private, so a field can
//! only be written once, by its own stage.

use std::fmt;

use analyst_shared::{AnalystError, Result, RunId};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A non-blank user query, stored exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Reject blank input; anything else is kept as given.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(AnalystError::validation("query must not be empty"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the web search stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebStatus {
    /// At least one result.
    Found,
    /// The service answered with no results; the sentinel was used.
    Empty,
    /// The call failed; `web_results` holds the error description.
    Degraded,
}

impl fmt::Display for WebStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Found => "found",
            Self::Empty => "empty",
            Self::Degraded => "degraded",
        })
    }
}

// ---------------------------------------------------------------------------
// Stage values
// ---------------------------------------------------------------------------

/// Start of a run: only the query is known.
#[derive(Debug, Clone)]
pub struct Seeded {
    run_id: RunId,
    query: Query,
}

impl Seeded {
    pub fn new(query: Query) -> Self {
        Self {
            run_id: RunId::new(),
            query,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub(crate) fn searched(self, web_results: String, web_status: WebStatus) -> Searched {
        Searched {
            seed: self,
            web_results,
            web_status,
        }
    }
}

/// After the external search stage.
#[derive(Debug, Clone)]
pub struct Searched {
    seed: Seeded,
    web_results: String,
    web_status: WebStatus,
}

impl Searched {
    pub fn query(&self) -> &Query {
        &self.seed.query
    }

    pub fn web_results(&self) -> &str {
        &self.web_results
    }

    pub fn web_status(&self) -> WebStatus {
        self.web_status
    }

    pub(crate) fn retrieved(self, internal_docs: String) -> Retrieved {
        Retrieved {
            prev: self,
            internal_docs,
        }
    }
}

/// After the internal retrieval stage.
#[derive(Debug, Clone)]
pub struct Retrieved {
    prev: Searched,
    internal_docs: String,
}

impl Retrieved {
    pub fn query(&self) -> &Query {
        self.prev.query()
    }

    pub fn web_results(&self) -> &str {
        self.prev.web_results()
    }

    pub fn internal_docs(&self) -> &str {
        &self.internal_docs
    }

    pub(crate) fn synthesized(self, insights: String) -> Synthesized {
        Synthesized {
            prev: self,
            insights,
        }
    }
}

/// After the insight synthesis stage.
#[derive(Debug, Clone)]
pub struct Synthesized {
    prev: Retrieved,
    insights: String,
}

impl Synthesized {
    pub fn query(&self) -> &Query {
        self.prev.query()
    }

    pub fn insights(&self) -> &str {
        &self.insights
    }

    pub(crate) fn reported(self, swot_report: String) -> PipelineState {
        let Synthesized { prev, insights } = self;
        let Retrieved {
            prev: searched,
            internal_docs,
        } = prev;
        let Searched {
            seed,
            web_results,
            web_status,
        } = searched;

        PipelineState {
            run_id: seed.run_id,
            query: seed.query,
            web_results,
            web_status,
            internal_docs,
            insights,
            swot_report,
        }
    }
}

/// The completed, immutable result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    run_id: RunId,
    query: Query,
    web_results: String,
    web_status: WebStatus,
    internal_docs: String,
    insights: String,
    swot_report: String,
}

impl PipelineState {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn web_results(&self) -> &str {
        &self.web_results
    }

    pub fn web_status(&self) -> WebStatus {
        self.web_status
    }

    pub fn internal_docs(&self) -> &str {
        &self.internal_docs
    }

    pub fn insights(&self) -> &str {
        &self.insights
    }

    /// Raw report text, verbatim from the model.
    pub fn swot_report(&self) -> &str {
        &self.swot_report
    }

    pub fn into_swot_report(self) -> String {
        self.swot_report
    }
}
