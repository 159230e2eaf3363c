//! Vector index abstraction.
//!
//! The index owns (chunk, embedding) pairs keyed by chunk ID, together with
//! the source records they were derived from and the memory-note log.
//! Search is an exact cosine-similarity linear scan — deterministic and
//! plenty fast for a single user's documents and notes. An approximate
//! index would be an internal swap behind the same trait.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::Result;
use crate::lang::Language;
use crate::source::{MemoryNote, SourceDocument, SourceKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical namespace within the index.
///
/// Documents and memory notes share one index implementation and are
/// separated by this filter field, not by duplicated stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Documents,
    Memory,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Documents => write!(f, "documents"),
            Partition::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "documents" => Ok(Partition::Documents),
            "memory" => Ok(Partition::Memory),
            _ => Err(format!("Unknown partition: {}", s)),
        }
    }
}

/// A chunk with its embedding and source metadata, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk itself.
    pub chunk: Chunk,
    /// Embedding vector; dimension must match the index configuration.
    pub embedding: Vec<f32>,
    /// Kind of the parent source.
    pub kind: SourceKind,
    /// Namespace this entry lives in.
    pub partition: Partition,
    /// Language of the parent source, when known.
    pub language: Option<Language>,
    /// When the entry was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexEntry {
    /// Build an entry from a chunk and its embedding.
    pub fn new(
        chunk: Chunk,
        embedding: Vec<f32>,
        kind: SourceKind,
        partition: Partition,
        language: Option<Language>,
    ) -> Self {
        Self {
            chunk,
            embedding,
            kind,
            partition,
            language,
            indexed_at: Utc::now(),
        }
    }
}

/// Filter applied during search, before ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchFilter {
    /// Restrict to one namespace.
    pub partition: Option<Partition>,
    /// Restrict to one source kind.
    pub kind: Option<SourceKind>,
}

impl SearchFilter {
    /// Filter matching everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Filter restricted to the memory partition.
    pub fn memory() -> Self {
        Self {
            partition: Some(Partition::Memory),
            kind: None,
        }
    }

    /// Filter restricted to the documents partition.
    pub fn documents() -> Self {
        Self {
            partition: Some(Partition::Documents),
            kind: None,
        }
    }

    fn matches(&self, entry: &IndexEntry) -> bool {
        self.partition.map_or(true, |p| entry.partition == p)
            && self.kind.map_or(true, |k| entry.kind == k)
    }
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query vector (higher is better).
    pub score: f32,
    /// Title of the parent source.
    pub source_title: String,
    /// Kind of the parent source.
    pub kind: SourceKind,
}

/// Summary of an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    pub id: Uuid,
    pub kind: SourceKind,
    pub title: String,
    pub chunk_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Trait for vector index backends.
///
/// Writers (`upsert`, `delete_source`) are serialized per backend so the
/// atomic-delete and no-partial-index invariants hold; readers scan a
/// stable snapshot and tolerate slightly stale results.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a source record. Called before its entries are upserted.
    async fn put_source(&self, doc: &SourceDocument) -> Result<()>;

    /// Fetch a source record by ID.
    async fn get_source(&self, id: Uuid) -> Result<Option<SourceDocument>>;

    /// List indexed sources, optionally restricted to one partition.
    async fn list_sources(&self, partition: Option<Partition>) -> Result<Vec<SourceSummary>>;

    /// Insert or replace entries. Re-upserting a chunk ID replaces the
    /// existing entry; it never duplicates. Rejects the whole batch with
    /// `IndexCorruption` if any vector's dimension mismatches the index,
    /// leaving existing entries untouched.
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<usize>;

    /// Nearest-neighbour search by cosine similarity.
    ///
    /// Returns at most `k` results in descending score order. Equal scores
    /// are broken by the lower chunk sequence index, then source ID, so
    /// ranking is reproducible.
    async fn search(&self, query: &[f32], k: usize, filter: &SearchFilter)
        -> Result<Vec<ScoredChunk>>;

    /// Delete a source and all its entries atomically: after this returns
    /// (or fails), either everything for the source is gone or nothing is.
    /// Superseded note records are kept as history.
    async fn delete_source(&self, source_id: Uuid) -> Result<usize>;

    /// Total number of index entries.
    async fn entry_count(&self) -> Result<usize>;

    /// Append a memory note record.
    async fn put_note(&self, note: &MemoryNote) -> Result<()>;

    /// List memory notes, newest first.
    async fn list_notes(&self, include_superseded: bool) -> Result<Vec<MemoryNote>>;

    /// Mark a note as superseded by a newer one.
    async fn mark_superseded(&self, old: Uuid, new: Uuid) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
///
/// Scale-invariant, which matters because embedding magnitudes vary by
/// provider. Mismatched or empty vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Rank scored entries: descending score, ties broken by sequence index
/// then source ID.
pub(crate) fn rank(results: &mut Vec<ScoredChunk>, k: usize) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk.seq.cmp(&b.chunk.seq))
            .then(a.chunk.source_id.cmp(&b.chunk.source_id))
    });
    results.truncate(k);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_scale_invariant() {
        let a = vec![1.0, 2.0, 3.0];
        let b: Vec<f32> = a.iter().map(|x| x * 40.0).collect();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_mismatched_dims() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_tie_break_prefers_lower_seq() {
        let source = Uuid::new_v4();
        let mk = |seq: u32, score: f32| ScoredChunk {
            chunk: Chunk {
                id: Uuid::new_v4(),
                source_id: source,
                seq,
                text: String::new(),
                start_char: 0,
                end_char: 0,
            },
            score,
            source_title: String::new(),
            kind: SourceKind::Note,
        };

        let mut results = vec![mk(3, 0.5), mk(1, 0.5), mk(2, 0.9)];
        rank(&mut results, 10);

        let seqs: Vec<u32> = results.iter().map(|r| r.chunk.seq).collect();
        assert_eq!(seqs, vec![2, 1, 3]);
    }
}
