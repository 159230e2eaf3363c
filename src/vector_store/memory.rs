//! In-memory vector store implementation.
//!
//! Useful for testing and ephemeral sessions; nothing survives a restart.

use super::{
    cosine_similarity, rank, IndexEntry, Partition, ScoredChunk, SearchFilter, SourceSummary,
    VectorStore,
};
use crate::error::{NovaError, Result};
use crate::source::{MemoryNote, SourceDocument};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory vector store.
pub struct MemoryVectorStore {
    dimensions: usize,
    entries: RwLock<HashMap<Uuid, IndexEntry>>,
    sources: RwLock<HashMap<Uuid, SourceDocument>>,
    notes: RwLock<Vec<MemoryNote>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory store for vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(HashMap::new()),
            sources: RwLock::new(HashMap::new()),
            notes: RwLock::new(Vec::new()),
        }
    }

    fn lock_err(e: impl std::fmt::Display) -> NovaError {
        NovaError::VectorStore(format!("Failed to acquire lock: {}", e))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn put_source(&self, doc: &SourceDocument) -> Result<()> {
        let mut sources = self.sources.write().map_err(Self::lock_err)?;
        sources.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get_source(&self, id: Uuid) -> Result<Option<SourceDocument>> {
        let sources = self.sources.read().map_err(Self::lock_err)?;
        Ok(sources.get(&id).cloned())
    }

    async fn list_sources(&self, partition: Option<Partition>) -> Result<Vec<SourceSummary>> {
        let sources = self.sources.read().map_err(Self::lock_err)?;
        let entries = self.entries.read().map_err(Self::lock_err)?;

        let mut summaries: Vec<SourceSummary> = sources
            .values()
            .filter(|doc| match partition {
                None => true,
                Some(p) => entries
                    .values()
                    .any(|e| e.chunk.source_id == doc.id && e.partition == p),
            })
            .map(|doc| SourceSummary {
                id: doc.id,
                kind: doc.kind,
                title: doc.title.clone(),
                chunk_count: entries
                    .values()
                    .filter(|e| e.chunk.source_id == doc.id)
                    .count() as u32,
                created_at: doc.created_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn upsert(&self, batch: &[IndexEntry]) -> Result<usize> {
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

        let mut entries = self.entries.write().map_err(Self::lock_err)?;
        for entry in batch {
            entries.insert(entry.chunk.id, entry.clone());
        }
        Ok(batch.len())
    }

    async fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read().map_err(Self::lock_err)?;
        let sources = self.sources.read().map_err(Self::lock_err)?;

        let mut results: Vec<ScoredChunk> = entries
            .values()
            .filter(|e| filter.matches(e))
            .map(|e| ScoredChunk {
                chunk: e.chunk.clone(),
                score: cosine_similarity(query, &e.embedding),
                source_title: sources
                    .get(&e.chunk.source_id)
                    .map(|s| s.title.clone())
                    .unwrap_or_default(),
                kind: e.kind,
            })
            .collect();

        rank(&mut results, k);
        Ok(results)
    }

    async fn delete_source(&self, source_id: Uuid) -> Result<usize> {
        // Take both write locks so no reader observes the source without
        // its entries or vice versa.
        let mut entries = self.entries.write().map_err(Self::lock_err)?;
        let mut sources = self.sources.write().map_err(Self::lock_err)?;

        let before = entries.len();
        entries.retain(|_, e| e.chunk.source_id != source_id);
        sources.remove(&source_id);

        // Superseded note records are history and stay on file.
        let mut notes = self.notes.write().map_err(Self::lock_err)?;
        notes.retain(|n| n.id != source_id || n.superseded_by.is_some());

        Ok(before - entries.len())
    }

    async fn entry_count(&self) -> Result<usize> {
        let entries = self.entries.read().map_err(Self::lock_err)?;
        Ok(entries.len())
    }

    async fn put_note(&self, note: &MemoryNote) -> Result<()> {
        let mut notes = self.notes.write().map_err(Self::lock_err)?;
        notes.push(note.clone());
        Ok(())
    }

    async fn list_notes(&self, include_superseded: bool) -> Result<Vec<MemoryNote>> {
        let notes = self.notes.read().map_err(Self::lock_err)?;
        let mut out: Vec<MemoryNote> = notes
            .iter()
            .filter(|n| include_superseded || n.superseded_by.is_none())
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn mark_superseded(&self, old: Uuid, new: Uuid) -> Result<()> {
        let mut notes = self.notes.write().map_err(Self::lock_err)?;
        match notes.iter_mut().find(|n| n.id == old) {
            Some(note) => {
                note.superseded_by = Some(new);
                Ok(())
            }
            None => Err(NovaError::InvalidInput(format!("No note with id {}", old))),
        }
    }
}
