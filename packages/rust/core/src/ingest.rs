//! Offline ingest: documents → chunks → embeddings → index.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use analyst_ingest::{TextSplitter, collect_sources, load_document};
use analyst_llm::Embedder;
use analyst_shared::{AnalystError, IndexedDocument, Result};
use analyst_storage::{ChunkInput, Storage};
use tracing::{debug, info, instrument, warn};

use crate::pipeline::SilentProgress;

/// Outcome of one ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// Documents written (new or changed).
    pub indexed: usize,
    /// Documents whose content hash matched the stored one.
    pub unchanged: usize,
    /// Documents that could not be loaded or had no text.
    pub failed: usize,
    /// Chunks written in this run.
    pub chunks: usize,
    pub elapsed: Duration,
}

/// Progress callback for ingest.
pub trait IngestProgress: Send + Sync {
    /// Called before each document is processed.
    fn document(&self, source: &str, current: usize, total: usize);
}

impl IngestProgress for SilentProgress {
    fn document(&self, _source: &str, _current: usize, _total: usize) {}
}

/// Load, split, embed and store every supported document under `paths`.
///
/// Unchanged documents are skipped by content hash; changed ones replace
/// their previous chunks. Unreadable documents are logged and counted, but
/// an embedding failure aborts the run.
#[instrument(skip_all, fields(paths = paths.len()))]
pub async fn ingest_documents(
    paths: &[PathBuf],
    storage: &Storage,
    embedder: &dyn Embedder,
    splitter: &TextSplitter,
    progress: &dyn IngestProgress,
) -> Result<IngestSummary> {
    let start = Instant::now();
    let sources = collect_sources(paths)?;
    if sources.is_empty() {
        return Err(AnalystError::validation(
            "no supported documents (.pdf, .txt, .md) found",
        ));
    }

    let total = sources.len();
    let mut summary = IngestSummary::default();

    for (i, path) in sources.iter().enumerate() {
        let source = path.display().to_string();
        progress.document(&source, i + 1, total);

        let loaded = match load_document(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %source, error = %e, "failed to load document, skipping");
                summary.failed += 1;
                continue;
            }
        };

        if let Some(existing) = storage.get_document(&loaded.source).await? {
            if existing.content_hash == loaded.content_hash {
                debug!(source = %loaded.source, "unchanged, skipping");
                summary.unchanged += 1;
                continue;
            }
        }

        let pieces = splitter.split(&loaded.text);
        if pieces.is_empty() {
            warn!(source = %loaded.source, "document has no text, skipping");
            summary.failed += 1;
            continue;
        }

        let mut chunks = Vec::with_capacity(pieces.len());
        for text in pieces {
            let embedding = embedder.embed(&text).await?;
            chunks.push(ChunkInput { text, embedding });
        }

        let doc = IndexedDocument {
            id: uuid::Uuid::now_v7().to_string(),
            source: loaded.source,
            content_hash: loaded.content_hash,
            chunk_count: chunks.len(),
            ingested_at: chrono::Utc::now(),
        };
        storage.replace_document(&doc, &chunks).await?;

        debug!(source = %doc.source, chunks = chunks.len(), "document indexed");
        summary.indexed += 1;
        summary.chunks += chunks.len();
    }

    summary.elapsed = start.elapsed();

    info!(
        indexed = summary.indexed,
        unchanged = summary.unchanged,
        failed = summary.failed,
        chunks = summary.chunks,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "ingest complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::CountingEmbedder;

    fn workspace() -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("analyst_core_ingest_{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(dir.join("docs")).unwrap();
        dir
    }

    #[tokio::test]
    async fn indexes_then_skips_unchanged() {
        let dir = workspace();
        std::fs::write(dir.join("docs/market.md"), "EV demand is rising in Europe.").unwrap();
        std::fs::write(dir.join("docs/notes.txt"), "Battery prices keep falling.").unwrap();
        let storage = Storage::open(&dir.join("index.db")).await.unwrap();
        let embedder = CountingEmbedder::default();
        let splitter = TextSplitter::default();
        let paths = vec![dir.join("docs")];

        let first = ingest_documents(&paths, &storage, &embedder, &splitter, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(first.indexed, 2);
        assert_eq!(first.chunks, 2);
        assert_eq!(storage.chunk_count().await.unwrap(), 2);

        let second = ingest_documents(&paths, &storage, &embedder, &splitter, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(second.indexed, 0);
        assert_eq!(second.unchanged, 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn changed_document_replaces_chunks() {
        let dir = workspace();
        let file = dir.join("docs/market.txt");
        std::fs::write(&file, "short").unwrap();
        let storage = Storage::open(&dir.join("index.db")).await.unwrap();
        let embedder = CountingEmbedder::default();
        let splitter = TextSplitter::new(50, 10).unwrap();

        ingest_documents(&[file.clone()], &storage, &embedder, &splitter, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(storage.chunk_count().await.unwrap(), 1);

        let long: String = (0..40).map(|i| format!("word{i} ")).collect();
        std::fs::write(&file, long).unwrap();
        let summary = ingest_documents(&[file], &storage, &embedder, &splitter, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(summary.indexed, 1);
        assert_eq!(storage.list_documents().await.unwrap().len(), 1);
        assert_eq!(storage.chunk_count().await.unwrap(), summary.chunks);
        assert!(summary.chunks > 1);
    }

    #[tokio::test]
    async fn unreadable_documents_are_counted() {
        let dir = workspace();
        std::fs::write(dir.join("docs/broken.pdf"), b"not a pdf").unwrap();
        std::fs::write(dir.join("docs/ok.txt"), "Solar installs doubled.").unwrap();
        let storage = Storage::open(&dir.join("index.db")).await.unwrap();

        let summary = ingest_documents(
            &[dir.join("docs")],
            &storage,
            &CountingEmbedder::default(),
            &TextSplitter::default(),
            &SilentProgress,
        )
        .await
        .unwrap();
        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn empty_directory_is_error() {
        let dir = workspace();
        let storage = Storage::open(&dir.join("index.db")).await.unwrap();
        let err = ingest_documents(
            &[dir.join("docs")],
            &storage,
            &CountingEmbedder::default(),
            &TextSplitter::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(err.is_client_error());
    }
}
