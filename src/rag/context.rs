//! Query-time retrieval over the vector index.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{ScoredChunk, SearchFilter, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Retrieves the top-k chunks for a query.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
    min_score: f32,
}

impl Retriever {
    /// Create a retriever with the given result budget and similarity floor.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            k: 6,
            min_score: 0.25,
        }
    }

    /// Set the maximum number of results.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the minimum similarity score. Results below the floor are
    /// dropped rather than padding the context with irrelevant chunks.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve ranked chunks for a query.
    ///
    /// Returns an empty result — never an error — when the index is empty
    /// or nothing clears the similarity floor.
    #[instrument(skip(self, query), fields(k = self.k))]
    pub async fn retrieve(&self, query: &str, filter: &SearchFilter) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self.store.search(&query_embedding, self.k, filter).await?;
        let kept: Vec<ScoredChunk> = results
            .into_iter()
            .filter(|r| r.score >= self.min_score)
            .collect();

        debug!("Retrieved {} chunks above floor {}", kept.len(), self.min_score);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::error::NovaError;
    use crate::source::{SourceDocument, SourceKind};
    use crate::vector_store::{IndexEntry, MemoryVectorStore, Partition};
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Deterministic embedder: maps known phrases onto fixed axes so
    /// ranking is fully predictable.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            // Axis 0: groceries, axis 1: appointments, axis 2: other.
            let grocery = ["milk", "store", "groceries", "buy"];
            let appointment = ["dentist", "friday", "appointment", "meeting"];
            let g = grocery.iter().filter(|w| lower.contains(*w)).count() as f32;
            let a = appointment.iter().filter(|w| lower.contains(*w)).count() as f32;
            let other = if g == 0.0 && a == 0.0 { 1.0 } else { 0.1 };
            Ok(vec![g, a, other])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                if t.trim().is_empty() {
                    return Err(NovaError::InvalidInput("empty text".to_string()));
                }
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

    async fn index_note(store: &MemoryVectorStore, text: &str) -> Uuid {
        let doc = SourceDocument::new(SourceKind::Note, text, text);
        store.put_source(&doc).await.unwrap();
        let embedding = StubEmbedder.embed(text).await.unwrap();
        store
            .upsert(&[IndexEntry::new(
                Chunk {
                    id: Uuid::new_v4(),
                    source_id: doc.id,
                    seq: 0,
                    text: text.to_string(),
                    start_char: 0,
                    end_char: text.chars().count(),
                },
                embedding,
                SourceKind::Note,
                Partition::Memory,
                None,
            )])
            .await
            .unwrap();
        doc.id
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_result() {
        let store = Arc::new(MemoryVectorStore::new(3));
        let retriever = Retriever::new(store, Arc::new(StubEmbedder));
        let results = retriever
            .retrieve("anything", &SearchFilter::any())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_semantic_ranking() {
        let store = Arc::new(MemoryVectorStore::new(3));
        let milk = index_note(&store, "buy milk").await;
        index_note(&store, "dentist on Friday").await;

        let retriever = Retriever::new(store, Arc::new(StubEmbedder)).with_min_score(0.1);
        let results = retriever
            .retrieve("what did I need from the store", &SearchFilter::memory())
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].chunk.source_id, milk);
    }

    #[tokio::test]
    async fn test_similarity_floor_drops_weak_matches() {
        let store = Arc::new(MemoryVectorStore::new(3));
        index_note(&store, "dentist on Friday").await;

        // A grocery query against an appointment note scores near zero.
        let retriever = Retriever::new(store, Arc::new(StubEmbedder)).with_min_score(0.8);
        let results = retriever
            .retrieve("buy milk at the store", &SearchFilter::memory())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
