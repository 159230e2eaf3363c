//! SQLite-based vector store implementation.
//!
//! Cosine similarity is computed in Rust over a full scan; SQLite is the
//! durability layer. Reload reconstructs the index deterministically as
//! long as the embedding model tag matches the one recorded at creation.

use super::{
    cosine_similarity, rank, IndexEntry, Partition, ScoredChunk, SearchFilter, SourceSummary,
    VectorStore,
};
use crate::error::{NovaError, Result};
use crate::lang::Language;
use crate::source::{MemoryNote, SourceDocument, SourceKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// SQLite-based vector store.
#[derive(Debug)]
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    dimensions: usize,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sources (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        text TEXT NOT NULL,
        language TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entries (
        chunk_id TEXT PRIMARY KEY,
        source_id TEXT NOT NULL,
        seq INTEGER NOT NULL,
        text TEXT NOT NULL,
        start_char INTEGER NOT NULL,
        end_char INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        kind TEXT NOT NULL,
        namespace TEXT NOT NULL,
        language TEXT,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_entries_source_id ON entries(source_id);
    CREATE INDEX IF NOT EXISTS idx_entries_namespace ON entries(namespace);

    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        title TEXT,
        text TEXT NOT NULL,
        tags TEXT NOT NULL,
        created_at TEXT NOT NULL,
        superseded_by TEXT
    );

    CREATE TABLE IF NOT EXISTS index_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

impl SqliteVectorStore {
    /// Open (or create) a store at the given path.
    ///
    /// `model_tag` and `dimensions` identify the embedding model the index
    /// was built with. Opening an existing index with a different model
    /// fails: mixed-dimension entries are never allowed, and the fix is to
    /// re-index, not to write through.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn new(path: &Path, model_tag: &str, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        Self::check_model(&conn, model_tag, dimensions)?;

        info!("Opened vector store at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory(model_tag: &str, dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Self::check_model(&conn, model_tag, dimensions)?;
        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    /// Verify or record the embedding model this index belongs to.
    fn check_model(conn: &Connection, model_tag: &str, dimensions: usize) -> Result<()> {
        let expected = format!("{}/{}", model_tag, dimensions);
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'embedding_model'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(existing) if existing != expected => Err(NovaError::IndexCorruption(format!(
                "Index was built with embedding model {} but the configured model is {}. \
                 Delete and re-ingest to switch models.",
                existing, expected
            ))),
            Some(_) => Ok(()),
            None => {
                conn.execute(
                    "INSERT INTO index_meta (key, value) VALUES ('embedding_model', ?1)",
                    params![expected],
                )?;
                Ok(())
            }
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| NovaError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_uuid(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap_or_default()
    }

    fn parse_time(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc), fields(source_id = %doc.id))]
    async fn put_source(&self, doc: &SourceDocument) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO sources (id, kind, title, text, language, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doc.id.to_string(),
                doc.kind.to_string(),
                doc.title,
                doc.text,
                doc.language.map(|l| l.code()),
                doc.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn get_source(&self, id: Uuid) -> Result<Option<SourceDocument>> {
        let conn = self.lock()?;
        let doc = conn
            .query_row(
                "SELECT id, kind, title, text, language, created_at FROM sources WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    let id_str: String = row.get(0)?;
                    let kind_str: String = row.get(1)?;
                    let lang_str: Option<String> = row.get(4)?;
                    let created_str: String = row.get(5)?;
                    Ok(SourceDocument {
                        id: Self::parse_uuid(&id_str),
                        kind: kind_str.parse().unwrap_or(SourceKind::UploadedFile),
                        title: row.get(2)?,
                        text: row.get(3)?,
                        language: lang_str.and_then(|s| Language::parse(&s).ok()),
                        created_at: Self::parse_time(&created_str),
                    })
                },
            )
            .optional()?;
        Ok(doc)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self, partition: Option<Partition>) -> Result<Vec<SourceSummary>> {
        let conn = self.lock()?;

        let (sql, filter_param) = match partition {
            Some(p) => (
                r#"
                SELECT s.id, s.kind, s.title, COUNT(e.chunk_id), s.created_at
                FROM sources s
                JOIN entries e ON e.source_id = s.id
                WHERE e.namespace = ?1
                GROUP BY s.id
                ORDER BY s.created_at DESC
                "#,
                Some(p.to_string()),
            ),
            None => (
                r#"
                SELECT s.id, s.kind, s.title, COUNT(e.chunk_id), s.created_at
                FROM sources s
                LEFT JOIN entries e ON e.source_id = s.id
                GROUP BY s.id
                ORDER BY s.created_at DESC
                "#,
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            let id_str: String = row.get(0)?;
            let kind_str: String = row.get(1)?;
            let created_str: String = row.get(4)?;
            Ok(SourceSummary {
                id: Self::parse_uuid(&id_str),
                kind: kind_str.parse().unwrap_or(SourceKind::UploadedFile),
                title: row.get(2)?,
                chunk_count: row.get(3)?,
                created_at: Self::parse_time(&created_str),
            })
        };

        let summaries: Vec<SourceSummary> = match filter_param {
            Some(p) => stmt
                .query_map(params![p], map_row)?
                .filter_map(|r| r.ok())
                .collect(),
            None => stmt
                .query_map([], map_row)?
                .filter_map(|r| r.ok())
                .collect(),
        };

        Ok(summaries)
    }

    #[instrument(skip(self, batch), fields(count = batch.len()))]
    async fn upsert(&self, batch: &[IndexEntry]) -> Result<usize> {
        // Reject the whole batch before touching the database so a
        // mismatched vector can never land next to valid entries.
        for entry in batch {
            if entry.embedding.len() != self.dimensions {
                return Err(NovaError::IndexCorruption(format!(
                    "Entry for chunk {} has dimension {}, index expects {}",
                    entry.chunk.id,
                    entry.embedding.len(),
                    self.dimensions
                )));
            }
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for entry in batch {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO entries
                (chunk_id, source_id, seq, text, start_char, end_char,
                 embedding, kind, namespace, language, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    entry.chunk.id.to_string(),
                    entry.chunk.source_id.to_string(),
                    entry.chunk.seq,
                    entry.chunk.text,
                    entry.chunk.start_char as i64,
                    entry.chunk.end_char as i64,
                    Self::embedding_to_bytes(&entry.embedding),
                    entry.kind.to_string(),
                    entry.partition.to_string(),
                    entry.language.map(|l| l.code()),
                    entry.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        debug!("Upserted {} entries", batch.len());
        Ok(batch.len())
    }

    #[instrument(skip(self, query))]
    async fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT e.chunk_id, e.source_id, e.seq, e.text, e.start_char, e.end_char,
                   e.embedding, e.kind, e.namespace, s.title
            FROM entries e
            LEFT JOIN sources s ON s.id = e.source_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let chunk_id: String = row.get(0)?;
            let source_id: String = row.get(1)?;
            let embedding_bytes: Vec<u8> = row.get(6)?;
            let kind_str: String = row.get(7)?;
            let partition_str: String = row.get(8)?;
            let title: Option<String> = row.get(9)?;

            Ok((
                crate::chunking::Chunk {
                    id: Self::parse_uuid(&chunk_id),
                    source_id: Self::parse_uuid(&source_id),
                    seq: row.get(2)?,
                    text: row.get(3)?,
                    start_char: row.get::<_, i64>(4)? as usize,
                    end_char: row.get::<_, i64>(5)? as usize,
                },
                Self::bytes_to_embedding(&embedding_bytes),
                kind_str.parse::<SourceKind>().unwrap_or(SourceKind::UploadedFile),
                partition_str.parse::<Partition>().unwrap_or(Partition::Documents),
                title.unwrap_or_default(),
            ))
        })?;

        let mut results: Vec<ScoredChunk> = rows
            .filter_map(|r| r.ok())
            .filter(|(_, _, kind, partition, _)| {
                filter.partition.map_or(true, |p| *partition == p)
                    && filter.kind.map_or(true, |fk| *kind == fk)
            })
            .map(|(chunk, embedding, kind, _, title)| ScoredChunk {
                score: cosine_similarity(query, &embedding),
                chunk,
                source_title: title,
                kind,
            })
            .collect();

        rank(&mut results, k);
        debug!("Search matched {} entries", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_source(&self, source_id: Uuid) -> Result<usize> {
        let conn = self.lock()?;
        // One transaction: either the source, its entries, and its note
        // record all go, or none do. A retry after a crash is safe.
        // Superseded note records are history and stay on file.
        let tx = conn.unchecked_transaction()?;

        let id = source_id.to_string();
        let deleted = tx.execute("DELETE FROM entries WHERE source_id = ?1", params![id])?;
        tx.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM notes WHERE id = ?1 AND superseded_by IS NULL",
            params![id],
        )?;

        tx.commit()?;
        info!("Deleted {} entries for source {}", deleted, source_id);
        Ok(deleted)
    }

    async fn entry_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn put_note(&self, note: &MemoryNote) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO notes (id, title, text, tags, created_at, superseded_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                note.id.to_string(),
                note.title,
                note.text,
                serde_json::to_string(&note.tags)?,
                note.created_at.to_rfc3339(),
                note.superseded_by.map(|id| id.to_string()),
            ],
        )?;
        Ok(())
    }

    async fn list_notes(&self, include_superseded: bool) -> Result<Vec<MemoryNote>> {
        let conn = self.lock()?;

        let sql = if include_superseded {
            "SELECT id, title, text, tags, created_at, superseded_by FROM notes ORDER BY created_at DESC"
        } else {
            "SELECT id, title, text, tags, created_at, superseded_by FROM notes \
             WHERE superseded_by IS NULL ORDER BY created_at DESC"
        };

        let mut stmt = conn.prepare(sql)?;
        let notes = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let tags_json: String = row.get(3)?;
            let created_str: String = row.get(4)?;
            let superseded_str: Option<String> = row.get(5)?;
            Ok(MemoryNote {
                id: Self::parse_uuid(&id_str),
                title: row.get(1)?,
                text: row.get(2)?,
                tags: serde_json::from_str(&tags_json).unwrap_or_default(),
                created_at: Self::parse_time(&created_str),
                superseded_by: superseded_str.map(|s| Self::parse_uuid(&s)),
            })
        })?;

        Ok(notes.filter_map(|n| n.ok()).collect())
    }

    async fn mark_superseded(&self, old: Uuid, new: Uuid) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE notes SET superseded_by = ?1 WHERE id = ?2",
            params![new.to_string(), old.to_string()],
        )?;
        if updated == 0 {
            return Err(NovaError::InvalidInput(format!("No note with id {}", old)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn entry(source_id: Uuid, seq: u32, text: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry::new(
            Chunk {
                id: Uuid::new_v4(),
                source_id,
                seq,
                text: text.to_string(),
                start_char: 0,
                end_char: text.chars().count(),
            },
            embedding,
            SourceKind::UploadedFile,
            Partition::Documents,
            None,
        )
    }

    #[tokio::test]
    async fn test_roundtrip_upsert_search_delete() {
        let store = SqliteVectorStore::in_memory("test-model", 3).unwrap();
        let source = SourceDocument::new(SourceKind::UploadedFile, "Report", "full text");
        store.put_source(&source).await.unwrap();

        store
            .upsert(&[
                entry(source.id, 0, "first", vec![1.0, 0.0, 0.0]),
                entry(source.id, 1, "second", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store
            .search(&[1.0, 0.0, 0.0], 10, &SearchFilter::any())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].chunk.text, "first");
        assert_eq!(results[0].source_title, "Report");

        let deleted = store.delete_source(source.id).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.entry_count().await.unwrap(), 0);
        assert!(store.get_source(source.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_model_mismatch_detected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");

        {
            let _store = SqliteVectorStore::new(&path, "model-a", 8).unwrap();
        }

        let err = SqliteVectorStore::new(&path, "model-b", 8).unwrap_err();
        assert!(matches!(err, NovaError::IndexCorruption(_)));

        // Same model reopens fine.
        SqliteVectorStore::new(&path, "model-a", 8).unwrap();
    }

    #[tokio::test]
    async fn test_embedding_blob_roundtrip() {
        let original = vec![0.25f32, -1.5, 3.75, 0.0];
        let bytes = SqliteVectorStore::embedding_to_bytes(&original);
        assert_eq!(SqliteVectorStore::bytes_to_embedding(&bytes), original);
    }

    #[tokio::test]
    async fn test_sources_persist_for_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");

        let source = SourceDocument::new(SourceKind::Transcript, "Talk", "transcript text");
        {
            let store = SqliteVectorStore::new(&path, "m", 2).unwrap();
            store.put_source(&source).await.unwrap();
            store
                .upsert(&[entry(source.id, 0, "transcript text", vec![1.0, 0.0])])
                .await
                .unwrap();
        }

        let store = SqliteVectorStore::new(&path, "m", 2).unwrap();
        let loaded = store.get_source(source.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Talk");
        assert_eq!(loaded.kind, SourceKind::Transcript);
        assert_eq!(store.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notes_table_roundtrip() {
        let store = SqliteVectorStore::in_memory("m", 2).unwrap();
        let note = MemoryNote::new(
            Some("Errands".to_string()),
            "buy milk",
            vec!["shopping".to_string()],
        );
        store.put_note(&note).await.unwrap();

        let notes = store.list_notes(false).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "buy milk");
        assert_eq!(notes[0].tags, vec!["shopping".to_string()]);
    }
}
