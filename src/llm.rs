//! Chat-model provider abstraction.
//!
//! The answerer and summarizer only ever need "system + user prompt in,
//! generated text out", so that is the whole seam. One implementation per
//! backing service; the engine core knows nothing about any vendor.

use crate::error::{NovaError, Result};
use crate::provider::{create_client_with_timeout, map_api_error};
use crate::retry::{with_retry, RetryPolicy};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Trait for text-generation providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a completion for a system + user prompt pair.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat provider backed by an OpenAI-compatible completions endpoint.
pub struct OpenAIChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAIChat {
    /// Create a provider for the given model.
    pub fn new(model: &str, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
            temperature: 0.2,
            retry,
        }
    }

    async fn complete_once(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| NovaError::InvalidInput(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| NovaError::InvalidInput(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| NovaError::InvalidInput(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| map_api_error("chat API", e))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| NovaError::ProviderUnavailable("Empty chat response".to_string()))
    }
}

#[async_trait]
impl ChatProvider for OpenAIChat {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        debug!("Requesting completion ({} prompt chars)", user.len());
        with_retry(&self.retry, "chat completion", || {
            self.complete_once(system, user)
        })
        .await
    }
}
