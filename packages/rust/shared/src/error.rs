//! Error types for the market analyst.
//!
//! Library crates use [`AnalystError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all market analyst operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalystError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP failure talking to a collaborator.
    #[error("network error: {0}")]
    Network(String),

    /// Web search service failure (bad status, malformed response).
    #[error("search error: {0}")]
    Search(String),

    /// Text-completion or embedding service failure.
    #[error("completion error: {0}")]
    Completion(String),

    /// Nearest-neighbor retrieval failure.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Index database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Document or response parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (blank query, missing prompt variable, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Document rendering error.
    #[error("render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AnalystError>;

impl AnalystError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from a client-side input problem rather than
    /// a failing collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AnalystError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = AnalystError::Search("HTTP 502 Bad Gateway".into());
        assert!(err.to_string().starts_with("search error:"));
    }

    #[test]
    fn validation_is_client_error() {
        assert!(AnalystError::validation("query is blank").is_client_error());
        assert!(!AnalystError::Completion("timeout".into()).is_client_error());
    }
}
