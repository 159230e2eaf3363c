//! Embedding generation for semantic indexing and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// Implementations guarantee that the output order matches the input order
/// and that every vector has exactly [`Embedder::dimensions`] components.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embedding vector dimension.
    fn dimensions(&self) -> usize;

    /// Provider/model tag recorded alongside the index, so a reload can
    /// tell whether stored vectors match the active model.
    fn model_tag(&self) -> String;
}
