//! Grounded answer generation.

use super::Answer;
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::ChatProvider;
use crate::vector_store::ScoredChunk;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Generates answers restricted to retrieved context.
pub struct GroundedAnswerer {
    chat: Arc<dyn ChatProvider>,
    prompts: Prompts,
}

impl GroundedAnswerer {
    /// Create an answerer over the given chat provider.
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self {
            chat,
            prompts: Prompts::default(),
        }
    }

    /// Use custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a question from retrieved chunks.
    ///
    /// With no retrieved context this returns the fixed not-grounded
    /// answer without calling the provider at all — the product promises
    /// document-grounded answers, so fabricating one from world knowledge
    /// is not an option. Provider failures propagate to the caller; there
    /// is no silent ungrounded fallback.
    #[instrument(skip(self, retrieved), fields(question = %question, chunks = retrieved.len()))]
    pub async fn answer(&self, question: &str, retrieved: &[ScoredChunk]) -> Result<Answer> {
        if retrieved.is_empty() {
            info!("No context retrieved, returning not-grounded answer");
            return Ok(Answer::not_grounded());
        }

        // Chunks go into the prompt in descending score order; the
        // citation list mirrors exactly what was sent.
        let context_text = format_context(retrieved);
        let citations: Vec<_> = retrieved.iter().map(|c| c.chunk.id).collect();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context_text);
        let user_prompt = self.prompts.render(&self.prompts.qa.user, &vars);

        let text = self.chat.complete(&self.prompts.qa.system, &user_prompt).await?;

        debug!("Generated answer with {} citations", citations.len());
        Ok(Answer {
            text,
            citations,
            grounded: true,
        })
    }
}

/// Format retrieved chunks for inclusion in a prompt.
fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "---\n[{}] {} ({})\n{}\n---",
                i + 1,
                chunk.source_title,
                chunk.kind,
                chunk.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::error::NovaError;
    use crate::rag::INSUFFICIENT_INFORMATION;
    use crate::source::SourceKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Chat stub that records the prompts it receives.
    struct RecordingChat {
        reply: String,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl RecordingChat {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for RecordingChat {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok(self.reply.clone())
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatProvider for FailingChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Err(NovaError::ProviderUnavailable("down".to_string()))
        }
    }

    fn scored(text: &str, seq: u32, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: Uuid::new_v4(),
                source_id: Uuid::new_v4(),
                seq,
                text: text.to_string(),
                start_char: 0,
                end_char: text.chars().count(),
            },
            score,
            source_title: "Project Plan".to_string(),
            kind: SourceKind::UploadedFile,
        }
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_not_grounded_and_skips_provider() {
        let chat = Arc::new(RecordingChat::new("should not be called"));
        let answerer = GroundedAnswerer::new(chat.clone());

        let answer = answerer.answer("What is the deadline?", &[]).await.unwrap();

        assert!(!answer.grounded);
        assert!(answer.citations.is_empty());
        assert!(answer.text.contains(INSUFFICIENT_INFORMATION));
        assert!(chat.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_grounded_answer_cites_sent_chunks_in_order() {
        let chat = Arc::new(RecordingChat::new("The deadline is Friday."));
        let answerer = GroundedAnswerer::new(chat.clone());

        let chunks = vec![
            scored("The deadline is Friday at noon.", 2, 0.9),
            scored("The team meets on Mondays.", 0, 0.5),
        ];
        let answer = answerer.answer("What is the deadline?", &chunks).await.unwrap();

        assert!(answer.grounded);
        assert_eq!(answer.text, "The deadline is Friday.");
        assert_eq!(
            answer.citations,
            vec![chunks[0].chunk.id, chunks[1].chunk.id]
        );

        // Both chunk texts and the question made it into the prompt.
        let seen = chat.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1.contains("The deadline is Friday at noon."));
        assert!(seen[0].1.contains("What is the deadline?"));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let answerer = GroundedAnswerer::new(Arc::new(FailingChat));
        let err = answerer
            .answer("question", &[scored("context", 0, 0.8)])
            .await
            .unwrap_err();
        assert!(matches!(err, NovaError::ProviderUnavailable(_)));
    }
}
