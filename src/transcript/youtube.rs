//! YouTube transcript extraction via caption tracks.
//!
//! Uses yt-dlp to list a video's caption tracks without downloading the
//! media, then fetches the chosen track in json3 format. Manual captions
//! win over auto-generated ones; within each set the video's own language
//! is preferred.

use super::{ExtractedTranscript, TranscriptExtractor, TranscriptSegment, VideoSource};
use crate::error::{NovaError, Result};
use crate::lang::Language;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Extracts transcripts from YouTube caption tracks.
pub struct YoutubeCaptionExtractor {
    http: reqwest::Client,
    timeout: Duration,
}

impl YoutubeCaptionExtractor {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NovaError::Http)?;
        Ok(Self { http, timeout })
    }

    /// Run yt-dlp to get video metadata including available caption tracks.
    async fn probe(&self, id: &str) -> Result<VideoInfo> {
        let url = format!("https://www.youtube.com/watch?v={}", id);
        debug!(video_id = %id, "Listing caption tracks");

        let output = run_bounded(
            self.timeout,
            "yt-dlp",
            Command::new("yt-dlp")
                .args(["--dump-json", "--skip-download", "--no-warnings", &url])
                .output(),
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NovaError::ExtractionFailed(format!(
                "yt-dlp failed for {}: {}",
                id,
                stderr.lines().last().unwrap_or("unknown error").trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| NovaError::ExtractionFailed(format!("Unreadable yt-dlp output: {}", e)))
    }
}

/// Run a subprocess future under a time budget. A stuck tool cannot hang
/// an extraction past the configured timeout.
async fn run_bounded<F>(timeout: Duration, tool: &str, fut: F) -> Result<std::process::Output>
where
    F: std::future::Future<Output = std::io::Result<std::process::Output>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NovaError::ToolNotFound(tool.to_string())
            } else {
                NovaError::ExtractionFailed(format!("Failed to run {}: {}", tool, e))
            }
        }),
        Err(_) => Err(NovaError::ExtractionFailed(format!(
            "{} did not finish within {:?}",
            tool, timeout
        ))),
    }
}

#[async_trait]
impl TranscriptExtractor for YoutubeCaptionExtractor {
    async fn extract(&self, source: &VideoSource) -> Result<ExtractedTranscript> {
        let id = match source {
            VideoSource::YouTube { id } => id,
            VideoSource::Local(path) => {
                return Err(NovaError::InvalidInput(format!(
                    "{} is a local file, not a YouTube video",
                    path.display()
                )))
            }
        };

        let info = self.probe(id).await?;
        let (track_lang, track) = pick_track(&info).ok_or_else(|| {
            NovaError::UnsupportedSource(format!(
                "Video {} has no caption tracks; transcript extraction is not possible",
                id
            ))
        })?;

        info!(video_id = %id, lang = %track_lang, "Fetching caption track");
        let body = self
            .http
            .get(&track.url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| NovaError::ExtractionFailed(format!("Caption fetch failed: {}", e)))?
            .text()
            .await?;

        let segments = parse_json3(&body)?;
        if segments.is_empty() {
            return Err(NovaError::ExtractionFailed(format!(
                "Caption track for {} contained no text",
                id
            )));
        }

        let language = lang_from_track_key(&track_lang);
        let title = if info.title.is_empty() {
            source.default_title()
        } else {
            info.title
        };
        Ok(ExtractedTranscript::from_segments(title, segments, language))
    }
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    subtitles: HashMap<String, Vec<CaptionTrack>>,
    #[serde(default)]
    automatic_captions: HashMap<String, Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    url: String,
    #[serde(default)]
    ext: String,
}

/// Choose a caption track: manual subtitles before auto captions, the
/// video's own language before English before anything else. Only json3
/// tracks are usable.
fn pick_track(info: &VideoInfo) -> Option<(String, &CaptionTrack)> {
    for tracks in [&info.subtitles, &info.automatic_captions] {
        if tracks.is_empty() {
            continue;
        }

        let mut candidates: Vec<&String> = Vec::new();
        if let Some(lang) = &info.language {
            candidates.extend(tracks.keys().filter(|k| k.starts_with(lang.as_str())));
        }
        candidates.extend(tracks.keys().filter(|k| k.starts_with("en")));
        let mut rest: Vec<&String> = tracks.keys().collect();
        rest.sort();
        candidates.extend(rest);

        for key in candidates {
            if let Some(track) = tracks[key].iter().find(|t| t.ext == "json3") {
                return Some((key.clone(), track));
            }
        }
    }
    None
}

/// Map a caption track key like "en" or "ta-IN" to a supported language.
fn lang_from_track_key(key: &str) -> Option<Language> {
    let code = key.split('-').next().unwrap_or(key);
    Language::parse(code).ok()
}

#[derive(Debug, Deserialize)]
struct Json3Body {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into timed segments.
fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let parsed: Json3Body = serde_json::from_str(body)
        .map_err(|e| NovaError::ExtractionFailed(format!("Unreadable caption data: {}", e)))?;

    let segments = parsed
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                start_seconds: event.t_start_ms as f64 / 1000.0,
                text,
            })
        })
        .collect();
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3_skips_empty_events() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "segs": [{"utf8": "Hello "}, {"utf8": "there"}]},
                {"tStartMs": 1500, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 3200, "segs": [{"utf8": "General Kenobi"}]}
            ]
        }"#;
        let segments = parse_json3(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello there");
        assert!((segments[1].start_seconds - 3.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_subprocess_time_budget_enforced() {
        let err = run_bounded(
            Duration::from_millis(10),
            "yt-dlp",
            std::future::pending::<std::io::Result<std::process::Output>>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NovaError::ExtractionFailed(_)));
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        let err = parse_json3("not json").unwrap_err();
        assert!(matches!(err, NovaError::ExtractionFailed(_)));
    }

    fn track(ext: &str) -> CaptionTrack {
        CaptionTrack {
            url: "https://example.com/track".to_string(),
            ext: ext.to_string(),
        }
    }

    #[test]
    fn test_pick_track_prefers_manual_subtitles() {
        let mut info = VideoInfo {
            title: String::new(),
            language: Some("ta".to_string()),
            subtitles: HashMap::new(),
            automatic_captions: HashMap::new(),
        };
        info.automatic_captions
            .insert("ta".to_string(), vec![track("json3")]);
        info.subtitles.insert("en".to_string(), vec![track("json3")]);

        let (lang, _) = pick_track(&info).unwrap();
        assert_eq!(lang, "en");
    }

    #[test]
    fn test_pick_track_prefers_video_language() {
        let mut info = VideoInfo {
            title: String::new(),
            language: Some("hi".to_string()),
            subtitles: HashMap::new(),
            automatic_captions: HashMap::new(),
        };
        info.automatic_captions
            .insert("en".to_string(), vec![track("json3")]);
        info.automatic_captions
            .insert("hi".to_string(), vec![track("json3")]);

        let (lang, _) = pick_track(&info).unwrap();
        assert_eq!(lang, "hi");
    }

    #[test]
    fn test_pick_track_requires_json3() {
        let mut info = VideoInfo {
            title: String::new(),
            language: None,
            subtitles: HashMap::new(),
            automatic_captions: HashMap::new(),
        };
        info.subtitles.insert("en".to_string(), vec![track("vtt")]);
        assert!(pick_track(&info).is_none());
    }

    #[test]
    fn test_lang_from_track_key() {
        assert_eq!(lang_from_track_key("en"), Some(Language::English));
        assert_eq!(lang_from_track_key("ta-IN"), Some(Language::Tamil));
        assert_eq!(lang_from_track_key("zz"), None);
    }
}
