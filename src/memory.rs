//! Append-only memory notes.
//!
//! A remembered note is stored as a record and indexed as a Note-kind
//! source in the memory namespace, so recall is just retrieval with a
//! memory filter. Notes are never edited in place; a correction creates a
//! new note and marks the old one superseded.

use crate::chunking::{chunk_text, ChunkConfig};
use crate::embedding::Embedder;
use crate::error::{NovaError, Result};
use crate::rag::Retriever;
use crate::source::{MemoryNote, SourceDocument, SourceKind};
use crate::vector_store::{IndexEntry, Partition, ScoredChunk, SearchFilter, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Store and recall personal memory notes.
pub struct MemoryStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunking: ChunkConfig,
    retriever: Retriever,
}

impl MemoryStore {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        let retriever = Retriever::new(store.clone(), embedder.clone());
        Self {
            store,
            embedder,
            chunking: ChunkConfig::default(),
            retriever,
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = retriever;
        self
    }

    /// Remember a note: persist it and index it for recall.
    ///
    /// If indexing fails the note is removed again, so a stored note is
    /// always recallable.
    #[instrument(skip_all)]
    pub async fn remember(
        &self,
        title: Option<String>,
        text: &str,
        tags: Vec<String>,
    ) -> Result<MemoryNote> {
        if text.trim().is_empty() {
            return Err(NovaError::InvalidInput(
                "Cannot remember an empty note".to_string(),
            ));
        }

        let note = MemoryNote::new(title, text, tags);
        self.store.put_note(&note).await?;

        if let Err(e) = self.index_note(&note).await {
            warn!(note_id = %note.id, "Indexing failed, removing stored note");
            if let Err(cleanup) = self.store.delete_source(note.id).await {
                warn!(note_id = %note.id, error = %cleanup, "Cleanup after failed indexing also failed");
            }
            return Err(e);
        }

        info!(note_id = %note.id, "Remembered note");
        Ok(note)
    }

    /// Recall notes relevant to a query. Empty when nothing matches.
    pub async fn recall(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retriever.retrieve(query, &SearchFilter::memory()).await
    }

    /// List stored notes, newest first.
    pub async fn list(&self, include_superseded: bool) -> Result<Vec<MemoryNote>> {
        self.store.list_notes(include_superseded).await
    }

    /// Replace an old note with a corrected one. The old note stays on
    /// record but is marked superseded and drops out of the index.
    #[instrument(skip_all, fields(old = %old_id))]
    pub async fn supersede(
        &self,
        old_id: Uuid,
        title: Option<String>,
        text: &str,
        tags: Vec<String>,
    ) -> Result<MemoryNote> {
        let existing = self.store.list_notes(true).await?;
        let old = existing
            .iter()
            .find(|n| n.id == old_id)
            .ok_or_else(|| NovaError::InvalidInput(format!("No note with ID {}", old_id)))?;
        if old.superseded_by.is_some() {
            return Err(NovaError::InvalidInput(format!(
                "Note {} is already superseded",
                old_id
            )));
        }

        let new_note = self.remember(title, text, tags).await?;
        self.store.mark_superseded(old_id, new_note.id).await?;
        // Drop the old note's index entries; the record itself stays as
        // history.
        self.store.delete_source(old_id).await?;

        info!(old = %old_id, new = %new_note.id, "Superseded note");
        Ok(new_note)
    }

    /// Chunk, embed, and upsert one note into the memory namespace.
    async fn index_note(&self, note: &MemoryNote) -> Result<()> {
        let text = note.indexable_text();
        let mut doc = SourceDocument::new(SourceKind::Note, note.display_title(), &text);
        doc.id = note.id;
        self.store.put_source(&doc).await?;

        let chunks = chunk_text(doc.id, &text, &self.chunking)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                IndexEntry::new(chunk, embedding, SourceKind::Note, Partition::Memory, None)
            })
            .collect();
        self.store.upsert(&entries).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;

    /// Embedder stub with keyword axes, mirroring the retrieval tests.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            let grocery = ["milk", "store", "groceries", "buy"];
            let appointment = ["dentist", "friday", "appointment"];
            let mut v = vec![0.05f32, 0.05, 0.05];
            v[0] += grocery.iter().filter(|w| lower.contains(**w)).count() as f32;
            v[1] += appointment.iter().filter(|w| lower.contains(**w)).count() as f32;
            v[2] += 0.1;
            Ok(v)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_tag(&self) -> String {
            "stub".to_string()
        }
    }

    fn memory_store() -> MemoryStore {
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new(3));
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder);
        let retriever = Retriever::new(store.clone(), embedder.clone()).with_min_score(0.0);
        MemoryStore::new(store, embedder).with_retriever(retriever)
    }

    #[tokio::test]
    async fn test_remember_and_recall() {
        let memory = memory_store();
        memory
            .remember(None, "Buy milk at the store", vec![])
            .await
            .unwrap();
        memory
            .remember(None, "Dentist appointment on Friday", vec![])
            .await
            .unwrap();

        let results = memory.recall("what do I need to buy").await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].chunk.text.contains("milk"));
    }

    #[tokio::test]
    async fn test_remember_rejects_empty() {
        let memory = memory_store();
        let err = memory.remember(None, "  ", vec![]).await.unwrap_err();
        assert!(matches!(err, NovaError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_supersede_replaces_in_recall() {
        let memory = memory_store();
        let old = memory
            .remember(None, "Buy milk at the store", vec![])
            .await
            .unwrap();
        let new = memory
            .supersede(old.id, None, "Buy oat milk at the store", vec![])
            .await
            .unwrap();

        let notes = memory.list(false).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, new.id);

        let all = memory.list(true).await.unwrap();
        assert_eq!(all.len(), 2);

        let results = memory.recall("buy milk").await.unwrap();
        assert!(results.iter().all(|r| r.chunk.source_id != old.id));
        assert!(results.iter().any(|r| r.chunk.text.contains("oat")));
    }

    #[tokio::test]
    async fn test_supersede_unknown_note_fails() {
        let memory = memory_store();
        let err = memory
            .supersede(Uuid::new_v4(), None, "whatever", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, NovaError::InvalidInput(_)));
    }
}
