//! Summarization and translation.
//!
//! Summaries are produced in a caller-chosen supported language regardless
//! of the input language. The output is checked against the requested
//! language and the length ceiling; a rejected result gets exactly one
//! stricter retry before the call fails with `TranslationIncomplete`.

use crate::config::{Prompts, SummarizeSettings};
use crate::error::{NovaError, Result};
use crate::lang::{self, Language};
use crate::llm::ChatProvider;
use crate::transcript::ExtractedTranscript;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces summaries in a target language via a chat provider.
pub struct Summarizer {
    chat: Arc<dyn ChatProvider>,
    prompts: Prompts,
    settings: SummarizeSettings,
}

impl Summarizer {
    pub fn new(chat: Arc<dyn ChatProvider>, settings: SummarizeSettings) -> Self {
        Self {
            chat,
            prompts: Prompts::default(),
            settings,
        }
    }

    /// Use custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Summary length ceiling in characters for the given input.
    ///
    /// Short inputs get a flat ceiling instead of the fraction; a hard
    /// fraction of a tweet-sized input would be useless.
    fn max_chars(&self, content: &str) -> usize {
        let len = content.chars().count();
        if len < self.settings.ceiling_exempt_chars {
            self.settings.ceiling_exempt_chars
        } else {
            ((len as f32 * self.settings.ceiling_ratio) as usize).max(1)
        }
    }

    /// Summarize text in the requested language.
    pub async fn summarize(&self, content: &str, language: Language) -> Result<String> {
        self.summarize_inner(content, language, false).await
    }

    /// Summarize a video transcript, including timestamped highlights when
    /// the transcript carries timing.
    pub async fn summarize_transcript(
        &self,
        transcript: &ExtractedTranscript,
        language: Language,
    ) -> Result<String> {
        let content = timestamped_text(transcript);
        let with_highlights = transcript.segments.len() > 1;
        self.summarize_inner(&content, language, with_highlights)
            .await
    }

    async fn summarize_inner(
        &self,
        content: &str,
        language: Language,
        with_highlights: bool,
    ) -> Result<String> {
        if content.trim().is_empty() {
            return Err(NovaError::InvalidInput(
                "Nothing to summarize: input is empty".to_string(),
            ));
        }

        let max_chars = self.max_chars(content);
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), language.name().to_string());
        vars.insert("max_chars".to_string(), max_chars.to_string());
        vars.insert("content".to_string(), content.to_string());
        vars.insert(
            "highlight_count".to_string(),
            self.settings.highlight_count.to_string(),
        );

        let mut user = self.prompts.render(&self.prompts.summarize.user, &vars);
        if with_highlights {
            user.push_str(&self.prompts.render(&self.prompts.summarize.highlights, &vars));
        }

        let first = self
            .chat
            .complete(&self.prompts.summarize.system, &user)
            .await?;
        match check_summary(&first, language, max_chars) {
            Ok(()) => return Ok(first),
            Err(reason) => {
                warn!(target_language = %language, reason = %reason, "Summary rejected, retrying once");
            }
        }

        let retry_user = self
            .prompts
            .render(&self.prompts.summarize.retry_user, &vars);
        let second = self
            .chat
            .complete(&self.prompts.summarize.system, &retry_user)
            .await?;
        match check_summary(&second, language, max_chars) {
            Ok(()) => Ok(second),
            Err(reason) => Err(NovaError::TranslationIncomplete(format!(
                "Summary still rejected after a retry: {}",
                reason
            ))),
        }
    }
}

/// Validate a summary against the requested language and length ceiling.
fn check_summary(
    output: &str,
    target: Language,
    max_chars: usize,
) -> std::result::Result<(), String> {
    if !matches_language(output, target) {
        return Err(format!("output is not in {}", target));
    }
    let len = output.chars().count();
    if len > max_chars {
        return Err(format!(
            "summary exceeds the length ceiling: {} > {}",
            len, max_chars
        ));
    }
    Ok(())
}

/// Whether the output plausibly is in the target language.
///
/// Detection can come back empty for short or mixed text; only a positive
/// detection of a *different* language counts as a mismatch.
fn matches_language(output: &str, target: Language) -> bool {
    match lang::detect(output) {
        Some(detected) => {
            debug!(detected = %detected, target = %target, "Detected summary language");
            detected == target
        }
        None => true,
    }
}

/// Transcript text with [MM:SS] markers so the model can quote timestamps.
fn timestamped_text(transcript: &ExtractedTranscript) -> String {
    if transcript.segments.len() <= 1 {
        return transcript.text.clone();
    }
    transcript
        .segments
        .iter()
        .map(|s| {
            let total = s.start_seconds.max(0.0) as u64;
            format!("[{:02}:{:02}] {}", total / 60, total % 60, s.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSegment;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Chat stub that replays canned responses and records prompts.
    struct ScriptedChat {
        responses: Mutex<Vec<String>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            self.seen.lock().unwrap().push(user.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| NovaError::ProviderUnavailable("No scripted response".to_string()))
        }
    }

    fn summarizer(chat: ScriptedChat) -> Summarizer {
        Summarizer::new(Arc::new(chat), SummarizeSettings::default())
    }

    fn long_input() -> String {
        "The meeting covered the quarterly roadmap in detail. ".repeat(20)
    }

    #[tokio::test]
    async fn test_summary_in_target_language_passes() {
        let s = summarizer(ScriptedChat::new(vec![
            "Voici le résumé de la réunion, avec les points principaux et les décisions prises.",
        ]));
        let out = s.summarize(&long_input(), Language::French).await.unwrap();
        assert!(out.starts_with("Voici"));
    }

    #[tokio::test]
    async fn test_wrong_language_retries_once_then_fails() {
        let chat = ScriptedChat::new(vec![
            "This summary is unfortunately written in English the first time.",
            "And it is still written in English the second time around too.",
        ]);
        let s = summarizer(chat);
        let err = s
            .summarize(&long_input(), Language::Tamil)
            .await
            .unwrap_err();
        assert!(matches!(err, NovaError::TranslationIncomplete(_)));
    }

    #[tokio::test]
    async fn test_wrong_language_recovers_on_retry() {
        let chat = ScriptedChat::new(vec![
            "This first answer is written in plain English sentences.",
            "கூட்டத்தின் சுருக்கம் இங்கே உள்ளது, முக்கிய முடிவுகளுடன்.",
        ]);
        let s = summarizer(chat);
        let out = s.summarize(&long_input(), Language::Tamil).await.unwrap();
        assert!(out.contains("சுருக்கம்"));
    }

    #[tokio::test]
    async fn test_prompt_carries_length_ceiling() {
        let input = long_input();
        let expected_ceiling = ((input.chars().count() as f32 * 0.4) as usize).to_string();

        let arc = Arc::new(ScriptedChat::new(vec![
            "A short summary of the meeting and its decisions.",
        ]));
        let s = Summarizer::new(arc.clone(), SummarizeSettings::default());
        s.summarize(&input, Language::English).await.unwrap();

        let seen = arc.seen.lock().unwrap();
        assert!(seen[0].contains(&expected_ceiling));
    }

    #[tokio::test]
    async fn test_short_input_gets_flat_ceiling() {
        let settings = SummarizeSettings::default();
        let arc = Arc::new(ScriptedChat::new(vec!["Short note summary."]));
        let s = Summarizer::new(arc.clone(), settings.clone());
        let input = "Buy milk and call the dentist tomorrow.";
        s.summarize(input, Language::English).await.unwrap();

        let seen = arc.seen.lock().unwrap();
        let ceiling = settings.ceiling_exempt_chars.to_string();
        assert!(seen[0].contains(&format!("under {} characters", ceiling)));
    }

    #[tokio::test]
    async fn test_overlong_summary_retries_once_then_fails() {
        let input = long_input();
        let ceiling = ((input.chars().count() as f32 * 0.4) as usize).max(1);
        let overlong = "This sentence pads the summary far past the permitted length. ".repeat(20);
        assert!(overlong.chars().count() > ceiling);

        let chat = ScriptedChat::new(vec![overlong.as_str(), overlong.as_str()]);
        let s = summarizer(chat);
        let err = s.summarize(&input, Language::English).await.unwrap_err();
        assert!(matches!(err, NovaError::TranslationIncomplete(_)));
        assert!(err.to_string().contains("ceiling"));
    }

    #[tokio::test]
    async fn test_overlong_summary_recovers_on_retry() {
        let input = long_input();
        let overlong = "This sentence pads the summary far past the permitted length. ".repeat(20);

        let chat = ScriptedChat::new(vec![
            overlong.as_str(),
            "The roadmap for the quarter was covered in detail.",
        ]);
        let s = summarizer(chat);
        let out = s.summarize(&input, Language::English).await.unwrap();
        assert!(out.starts_with("The roadmap"));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let s = summarizer(ScriptedChat::new(vec![]));
        let err = s.summarize("   ", Language::English).await.unwrap_err();
        assert!(matches!(err, NovaError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_transcript_highlights_prompt() {
        let arc = Arc::new(ScriptedChat::new(vec![
            "Summary of the talk. Highlights: [00:05] introduction.",
        ]));
        let s = Summarizer::new(arc.clone(), SummarizeSettings::default());
        let transcript = ExtractedTranscript::from_segments(
            "Talk".to_string(),
            vec![
                TranscriptSegment {
                    start_seconds: 5.0,
                    text: "Welcome to the talk about storage engines.".to_string(),
                },
                TranscriptSegment {
                    start_seconds: 65.0,
                    text: "Write amplification is the core tradeoff.".to_string(),
                },
            ],
            Some(Language::English),
        );

        s.summarize_transcript(&transcript, Language::English)
            .await
            .unwrap();

        let seen = arc.seen.lock().unwrap();
        assert!(seen[0].contains("[00:05]"));
        assert!(seen[0].contains("[01:05]"));
        assert!(seen[0].contains("Highlights"));
    }
}
