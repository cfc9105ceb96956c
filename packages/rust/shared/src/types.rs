//! Core domain types shared across the market analyst crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Index records
// ---------------------------------------------------------------------------

/// A source document recorded in the internal index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Unique document identifier (UUID v7).
    pub id: String,
    /// Where the document was loaded from.
    pub source: String,
    /// SHA-256 hash of the extracted text.
    pub content_hash: String,
    /// Number of chunks stored for this document.
    pub chunk_count: usize,
    /// When the document was ingested.
    pub ingested_at: DateTime<Utc>,
}

/// A text chunk returned by a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk text, exactly as stored.
    pub text: String,
    /// Source of the owning document.
    pub source: String,
    /// Cosine similarity to the query (higher is closer).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn run_ids_sort_by_creation() {
        let a = RunId::new();
        let b = RunId::new();
        assert!(a.0 <= b.0);
    }

    #[test]
    fn retrieved_chunk_serialization() {
        let chunk = RetrievedChunk {
            text: "EV demand grew 30% in 2024.".into(),
            source: "research.pdf".into(),
            score: 0.87,
        };
        let json = serde_json::to_string(&chunk).expect("serialize");
        let parsed: RetrievedChunk = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, chunk);
    }
}
