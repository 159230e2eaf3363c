//! Local media transcription via the OpenAI Whisper API.

use super::{ExtractedTranscript, TranscriptExtractor, TranscriptSegment, VideoSource};
use crate::error::{NovaError, Result};
use crate::lang::Language;
use crate::provider::{create_client_with_timeout, map_api_error};
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Transcribes local audio/video files with Whisper.
pub struct WhisperExtractor {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperExtractor {
    pub fn new() -> Result<Self> {
        Self::with_config("whisper-1", 120)
    }

    pub fn with_config(model: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(std::time::Duration::from_secs(timeout_secs)),
            model: model.to_string(),
        })
    }

    async fn transcribe_file(&self, path: &Path) -> Result<ExtractedTranscript> {
        debug!(path = %path.display(), "Transcribing local media");
        let file_bytes = tokio::fs::read(path).await?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                file_name.clone(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| {
                NovaError::ExtractionFailed(format!("Failed to build transcription request: {}", e))
            })?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| map_api_error("Whisper transcription", e))?;

        let language = Language::parse(&response.language).ok();

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| TranscriptSegment {
                        start_seconds: s.start as f64,
                        text: s.text.trim().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![TranscriptSegment {
                    start_seconds: 0.0,
                    text: response.text.trim().to_string(),
                }]
            });

        if segments.iter().all(|s| s.text.is_empty()) {
            return Err(NovaError::ExtractionFailed(format!(
                "Whisper returned no text for {}",
                path.display()
            )));
        }

        info!(path = %path.display(), segments = segments.len(), "Transcription complete");
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("local media")
            .to_string();
        Ok(ExtractedTranscript::from_segments(title, segments, language))
    }
}

#[async_trait]
impl TranscriptExtractor for WhisperExtractor {
    async fn extract(&self, source: &VideoSource) -> Result<ExtractedTranscript> {
        let path = match source {
            VideoSource::Local(path) => path,
            VideoSource::YouTube { id } => {
                return Err(NovaError::InvalidInput(format!(
                    "{} is a YouTube video, not a local file",
                    id
                )))
            }
        };

        if !path.is_file() {
            return Err(NovaError::UnsupportedSource(format!(
                "File not found: {}",
                path.display()
            )));
        }

        self.transcribe_file(path).await
    }
}
