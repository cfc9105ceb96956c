//! libSQL-backed nearest-neighbor text index.
//!
//! The [`Storage`] struct wraps a local libSQL database holding ingested
//! documents and their embedded chunks. Queries are answered by a flat
//! cosine-similarity scan over every stored chunk.
//!
//! **Access rules:**
//! - `ingest`: read-write (sole writer) via [`Storage::open`]
//! - pipeline runs: read-only via [`Storage::open_readonly`], safe to share
//!   between concurrent runs behind an `Arc`

mod migrations;
mod vector;

use std::path::Path;

use analyst_shared::{AnalystError, IndexedDocument, Result, RetrievedChunk};
use libsql::{Connection, Database, params};

/// A chunk ready to be written: text plus its embedding.
#[derive(Debug, Clone)]
pub struct ChunkInput {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("readonly", &self.readonly)
            .finish_non_exhaustive()
    }
}

fn storage_err(e: impl std::fmt::Display) -> AnalystError {
    AnalystError::Storage(e.to_string())
}

impl Storage {
    /// Open or create an index at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AnalystError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing index at `path` in read-only mode.
    ///
    /// Fails if nothing has been ingested there yet, instead of silently
    /// creating an empty database.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AnalystError::Storage(format!(
                "no index found at {}; run `market-analyst ingest` first",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: true,
        };
        if storage.get_schema_version().await == 0 {
            return Err(AnalystError::Storage(format!(
                "{} is not an initialised index",
                path.display()
            )));
        }
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        AnalystError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(AnalystError::Storage(
                "index is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Document operations
    // -----------------------------------------------------------------------

    /// Store a document and its chunks, replacing any previous version of
    /// the same source. Runs in a single transaction.
    pub async fn replace_document(
        &self,
        doc: &IndexedDocument,
        chunks: &[ChunkInput],
    ) -> Result<()> {
        self.check_writable()?;

        let tx = self.conn.transaction().await.map_err(storage_err)?;

        tx.execute(
            "DELETE FROM chunks WHERE document_id IN (SELECT id FROM documents WHERE source = ?1)",
            params![doc.source.as_str()],
        )
        .await
        .map_err(storage_err)?;
        tx.execute(
            "DELETE FROM documents WHERE source = ?1",
            params![doc.source.as_str()],
        )
        .await
        .map_err(storage_err)?;

        tx.execute(
            "INSERT INTO documents (id, source, content_hash, chunk_count, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                doc.id.as_str(),
                doc.source.as_str(),
                doc.content_hash.as_str(),
                chunks.len() as i64,
                doc.ingested_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(storage_err)?;

        for (ordinal, chunk) in chunks.iter().enumerate() {
            tx.execute(
                "INSERT INTO chunks (document_id, ordinal, text, dim, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    doc.id.as_str(),
                    ordinal as i64,
                    chunk.text.as_str(),
                    chunk.embedding.len() as i64,
                    vector::encode(&chunk.embedding),
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    /// Look up a document by its source.
    pub async fn get_document(&self, source: &str) -> Result<Option<IndexedDocument>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, source, content_hash, chunk_count, ingested_at
                 FROM documents WHERE source = ?1",
                params![source],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_document(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// List all documents, ordered by source.
    pub async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, source, content_hash, chunk_count, ingested_at
                 FROM documents ORDER BY source",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_document(&row)?);
        }
        Ok(results)
    }

    /// Total number of stored chunks.
    pub async fn chunk_count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM chunks", params![])
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).map_err(storage_err)? as usize),
            Ok(None) => Ok(0),
            Err(e) => Err(storage_err(e)),
        }
    }

    // -----------------------------------------------------------------------
    // Similarity search
    // -----------------------------------------------------------------------

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Chunks whose stored dimension differs from the query's are an error:
    /// the index was built with a different embedding model.
    pub async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut rows = self
            .conn
            .query(
                "SELECT c.text, d.source, c.dim, c.embedding
                 FROM chunks c
                 JOIN documents d ON d.id = c.document_id
                 ORDER BY c.id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut scored: Vec<RetrievedChunk> = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let text: String = row.get(0).map_err(storage_err)?;
            let source: String = row.get(1).map_err(storage_err)?;
            let dim: i64 = row.get(2).map_err(storage_err)?;
            let blob: Vec<u8> = row.get(3).map_err(storage_err)?;

            if dim as usize != query.len() {
                return Err(AnalystError::Retrieval(format!(
                    "embedding dimension mismatch: index has {dim}, query has {}",
                    query.len()
                )));
            }
            let embedding = vector::decode(&blob).ok_or_else(|| {
                AnalystError::Storage(format!("corrupt embedding for chunk from {source}"))
            })?;

            let score = vector::cosine(query, &embedding);
            scored.push(RetrievedChunk {
                text,
                source,
                score,
            });
        }

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Convert a database row to an [`IndexedDocument`].
fn row_to_document(row: &libsql::Row) -> Result<IndexedDocument> {
    Ok(IndexedDocument {
        id: row.get::<String>(0).map_err(storage_err)?,
        source: row.get::<String>(1).map_err(storage_err)?,
        content_hash: row.get::<String>(2).map_err(storage_err)?,
        chunk_count: row.get::<i64>(3).map_err(storage_err)? as usize,
        ingested_at: {
            let s: String = row.get(4).map_err(storage_err)?;
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| AnalystError::Storage(format!("invalid date: {e}")))?
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("analyst_test_{}.db", Uuid::now_v7()))
    }

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        Storage::open(&temp_path()).await.expect("open test db")
    }

    fn doc(source: &str, hash: &str) -> IndexedDocument {
        IndexedDocument {
            id: Uuid::now_v7().to_string(),
            source: source.into(),
            content_hash: hash.into(),
            chunk_count: 0,
            ingested_at: Utc::now(),
        }
    }

    fn chunk(text: &str, embedding: &[f32]) -> ChunkInput {
        ChunkInput {
            text: text.into(),
            embedding: embedding.to_vec(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let path = temp_path();
        let first = Storage::open(&path).await.unwrap();
        drop(first);
        let second = Storage::open(&path).await.expect("reopen");
        assert_eq!(second.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn replace_and_list_documents() {
        let storage = test_storage().await;
        storage
            .replace_document(
                &doc("report.pdf", "h1"),
                &[chunk("alpha", &[1.0, 0.0]), chunk("beta", &[0.0, 1.0])],
            )
            .await
            .expect("insert");

        let stored = storage.get_document("report.pdf").await.unwrap().unwrap();
        assert_eq!(stored.content_hash, "h1");
        assert_eq!(stored.chunk_count, 2);
        assert_eq!(storage.chunk_count().await.unwrap(), 2);

        // Replacing the same source drops the old chunks.
        storage
            .replace_document(&doc("report.pdf", "h2"), &[chunk("gamma", &[1.0, 1.0])])
            .await
            .expect("replace");

        let docs = storage.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content_hash, "h2");
        assert_eq!(storage.chunk_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn nearest_orders_by_similarity() {
        let storage = test_storage().await;
        storage
            .replace_document(
                &doc("a.txt", "ha"),
                &[
                    chunk("batteries", &[1.0, 0.0, 0.0]),
                    chunk("charging", &[0.7, 0.7, 0.0]),
                ],
            )
            .await
            .unwrap();
        storage
            .replace_document(
                &doc("b.txt", "hb"),
                &[
                    chunk("tariffs", &[0.0, 0.0, 1.0]),
                    chunk("subsidies", &[0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let hits = storage.nearest(&[1.0, 0.1, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].text, "batteries");
        assert_eq!(hits[0].source, "a.txt");
        assert_eq!(hits[1].text, "charging");
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[tokio::test]
    async fn nearest_on_empty_index() {
        let storage = test_storage().await;
        let hits = storage.nearest(&[1.0, 0.0], 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn nearest_rejects_dimension_mismatch() {
        let storage = test_storage().await;
        storage
            .replace_document(&doc("a.txt", "ha"), &[chunk("x", &[1.0, 0.0, 0.0])])
            .await
            .unwrap();
        let err = storage.nearest(&[1.0, 0.0], 3).await.unwrap_err();
        assert!(matches!(err, AnalystError::Retrieval(_)));
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = temp_path();
        let rw = Storage::open(&tmp).await.unwrap();
        rw.replace_document(&doc("a.txt", "h"), &[chunk("x", &[1.0])])
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.nearest(&[1.0], 3).await.unwrap().len(), 1);
        let result = ro.replace_document(&doc("b.txt", "h"), &[]).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_index() {
        let result = Storage::open_readonly(&temp_path()).await;
        assert!(result.unwrap_err().to_string().contains("ingest"));
    }

    #[tokio::test]
    async fn debug_omits_connection() {
        let storage = test_storage().await;
        assert_eq!(format!("{storage:?}"), "Storage { readonly: false, .. }");
    }
}
