//! OpenAI-compatible embeddings implementation.

use super::Embedder;
use crate::error::{NovaError, Result};
use crate::provider::{create_client_with_timeout, map_api_error};
use crate::retry::{with_retry, RetryPolicy};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible embeddings endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    /// Create an embedder with default settings.
    pub fn new() -> Self {
        Self::with_config("text-embedding-3-small", 1536, RetryPolicy::default(), Duration::from_secs(120))
    }

    /// Create an embedder with custom model, dimensions, and budgets.
    pub fn with_config(
        model: &str,
        dimensions: usize,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
            dimensions,
            retry,
        }
    }

    async fn embed_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(texts.to_vec()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| NovaError::InvalidInput(format!("Failed to build embedding request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| map_api_error("embedding API", e))?;

        // Sort by index so the output order matches the input order.
        let mut data: Vec<_> = response.data.into_iter().collect();
        data.sort_by_key(|e| e.index);

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

impl Default for OpenAIEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| NovaError::ProviderUnavailable("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(NovaError::InvalidInput(format!(
                "Cannot embed empty text (input {})",
                pos
            )));
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // The provider caps batch sizes; process in bounded slices.
        const BATCH_SIZE: usize = 100;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let vectors =
                with_retry(&self.retry, "embed_batch", || self.embed_once(batch)).await?;

            for vector in &vectors {
                if vector.len() != self.dimensions {
                    return Err(NovaError::IndexCorruption(format!(
                        "Provider returned a {}-dimension vector, expected {}",
                        vector.len(),
                        self.dimensions
                    )));
                }
            }
            all_embeddings.extend(vectors);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_tag(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_configuration() {
        let embedder = OpenAIEmbedder::new();
        assert_eq!(embedder.dimensions(), 1536);
        assert_eq!(embedder.model_tag(), "text-embedding-3-small");

        let embedder = OpenAIEmbedder::with_config(
            "text-embedding-3-large",
            3072,
            RetryPolicy::default(),
            Duration::from_secs(60),
        );
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_an_error() {
        let embedder = OpenAIEmbedder::new();
        let out = embedder.embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_any_call() {
        let embedder = OpenAIEmbedder::new();
        let err = embedder
            .embed_batch(&["fine".to_string(), "   ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, NovaError::InvalidInput(_)));
    }
}
