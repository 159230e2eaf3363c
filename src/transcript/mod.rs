//! Transcript extraction from video sources.
//!
//! A video source is either a remote YouTube reference or a local media
//! file. Extraction produces plain transcript text plus the detected
//! language; downstream the transcript is just another source document.

mod local;
mod youtube;

pub use local::WhisperExtractor;
pub use youtube::YoutubeCaptionExtractor;

use crate::error::{NovaError, Result};
use crate::lang::Language;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media file extensions the local extractor accepts.
const MEDIA_EXTENSIONS: &[&str] = &["mp3", "mp4", "m4a", "wav", "mov", "mkv", "webm", "ogg"];

/// A video source to extract a transcript from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A YouTube video, by 11-character ID.
    YouTube { id: String },
    /// A local audio/video file.
    Local(PathBuf),
}

impl VideoSource {
    /// Parse user input into a video source.
    ///
    /// Accepts YouTube URLs in the common formats, bare 11-character video
    /// IDs, and paths to existing local media files. Anything else is
    /// `UnsupportedSource`.
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(id) = extract_youtube_id(input) {
            return Ok(VideoSource::YouTube { id });
        }

        let path = PathBuf::from(shellexpand::tilde(input.trim()).to_string());
        if path.is_file() {
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| MEDIA_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false);
            if supported {
                return Ok(VideoSource::Local(path));
            }
            return Err(NovaError::UnsupportedSource(format!(
                "{} is not a supported media file type",
                path.display()
            )));
        }

        Err(NovaError::UnsupportedSource(format!(
            "Not a YouTube reference or local media file: {}",
            input
        )))
    }

    /// Display title derived from the source itself, used until a better
    /// one is known.
    pub fn default_title(&self) -> String {
        match self {
            VideoSource::YouTube { id } => format!("YouTube {}", id),
            VideoSource::Local(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("local media")
                .to_string(),
        }
    }
}

/// Extract a YouTube video ID from a URL or bare ID.
fn extract_youtube_id(input: &str) -> Option<String> {
    let re = Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex");

    let caps = re.captures(input.trim())?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// A timed transcript segment, kept so summaries can emit highlight
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Segment text.
    pub text: String,
}

/// Result of transcript extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedTranscript {
    /// Video title, when the source provides one.
    pub title: String,
    /// Full transcript text.
    pub text: String,
    /// Detected transcript language, when known.
    pub language: Option<Language>,
    /// Timed segments in chronological order.
    pub segments: Vec<TranscriptSegment>,
}

impl ExtractedTranscript {
    /// Build a transcript from timed segments, joining the full text.
    pub fn from_segments(
        title: String,
        segments: Vec<TranscriptSegment>,
        language: Option<Language>,
    ) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            title,
            text,
            language,
            segments,
        }
    }
}

/// Trait for transcript extraction backends.
#[async_trait]
pub trait TranscriptExtractor: Send + Sync {
    /// Extract a transcript from the given source.
    async fn extract(&self, source: &VideoSource) -> Result<ExtractedTranscript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_youtube_urls() {
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(
                VideoSource::parse(input).unwrap(),
                VideoSource::YouTube {
                    id: "dQw4w9WgXcQ".to_string()
                }
            );
        }
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        let err = VideoSource::parse("not-a-video-reference").unwrap_err();
        assert!(matches!(err, NovaError::UnsupportedSource(_)));

        let err = VideoSource::parse("/no/such/file.mp4").unwrap_err();
        assert!(matches!(err, NovaError::UnsupportedSource(_)));
    }

    #[test]
    fn test_parse_rejects_non_media_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "text").unwrap();

        let err = VideoSource::parse(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, NovaError::UnsupportedSource(_)));
    }

    #[test]
    fn test_parse_accepts_media_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.mp4");
        std::fs::write(&path, "fake").unwrap();

        let source = VideoSource::parse(path.to_str().unwrap()).unwrap();
        assert_eq!(source, VideoSource::Local(path));
    }

    #[test]
    fn test_from_segments_joins_text() {
        let transcript = ExtractedTranscript::from_segments(
            "Talk".to_string(),
            vec![
                TranscriptSegment {
                    start_seconds: 0.0,
                    text: "Hello everyone. ".to_string(),
                },
                TranscriptSegment {
                    start_seconds: 4.5,
                    text: "Today we discuss chunking.".to_string(),
                },
            ],
            Some(Language::English),
        );
        assert_eq!(transcript.text, "Hello everyone. Today we discuss chunking.");
        assert_eq!(transcript.segments.len(), 2);
    }
}
