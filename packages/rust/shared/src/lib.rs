//! Shared types, error model, and configuration for the market analyst.
//!
//! This crate is the foundation depended on by all other analyst crates.
//! It provides:
//! - [`AnalystError`]: the unified error type
//! - Domain types ([`RunId`], [`RetrievedChunk`], [`IndexedDocument`])
//! - Configuration ([`AppConfig`], [`AnalystConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AnalystConfig, AppConfig, IndexConfig, LlmConfig, SearchConfig, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{AnalystError, Result};
pub use types::{IndexedDocument, RetrievedChunk, RunId};
