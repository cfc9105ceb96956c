//! Offline corpus preparation for the internal index.
//!
//! This crate provides:
//! - [`loader`]: reads `.txt`, `.md` and `.pdf` files into plain text
//! - [`splitter`]: recursive character splitter (500 / 100 by default)

pub mod loader;
pub mod splitter;

pub use loader::{LoadedDocument, collect_sources, load_document};
pub use splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, TextSplitter};
