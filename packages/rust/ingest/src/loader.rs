//! Document loading: plain text, Markdown and PDF.

use std::path::{Path, PathBuf};

use analyst_shared::{AnalystError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Extensions read as UTF-8 text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// A document's extracted text plus identity.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Path the document was read from, as given.
    pub source: String,
    /// Extracted plain text.
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub content_hash: String,
}

/// Whether `path` has an extension the loader understands.
pub fn is_supported(path: &Path) -> bool {
    match extension(path).as_deref() {
        Some("pdf") => true,
        Some(ext) => TEXT_EXTENSIONS.contains(&ext),
        None => false,
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Expand the given paths into a sorted list of supported files.
///
/// Directories are walked recursively; unsupported files inside them are
/// skipped, but an explicitly named unsupported file is an error.
pub fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, &mut files)?;
        } else if is_supported(path) {
            files.push(path.clone());
        } else if !path.exists() {
            return Err(AnalystError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ));
        } else {
            return Err(AnalystError::validation(format!(
                "unsupported document type: {}",
                path.display()
            )));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| AnalystError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AnalystError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, out)?;
        } else if is_supported(&path) {
            out.push(path);
        } else {
            debug!(path = %path.display(), "skipping unsupported file");
        }
    }
    Ok(())
}

/// Load one document and extract its text.
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let text = match extension(path).as_deref() {
        Some("pdf") => extract_pdf_text(path)?,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {
            std::fs::read_to_string(path).map_err(|e| AnalystError::io(path, e))?
        }
        _ => {
            return Err(AnalystError::validation(format!(
                "unsupported document type: {}",
                path.display()
            )));
        }
    };

    Ok(LoadedDocument {
        source: path.display().to_string(),
        content_hash: content_hash(&text),
        text,
    })
}

/// Concatenate the text of every page, one page per line block.
fn extract_pdf_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| AnalystError::parse(format!("{}: {e}", path.display())))?;

    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    page = page_num,
                    error = %e,
                    "page text extraction failed"
                );
            }
        }
    }

    if text.trim().is_empty() {
        return Err(AnalystError::parse(format!(
            "{}: no extractable text (scanned PDF?)",
            path.display()
        )));
    }
    Ok(text)
}

/// Hex SHA-256 of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
