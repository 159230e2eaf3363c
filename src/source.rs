//! Source document model.
//!
//! Every piece of text the engine ingests — an uploaded file, a fetched
//! URL, a memory note, a video transcript — is unified under one
//! [`SourceDocument`] shape with a kind tag. Documents are immutable once
//! ingested; amending means ingesting a new document.

use crate::lang::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of ingested source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Text file uploaded by the user.
    UploadedFile,
    /// Text fetched from a URL.
    Url,
    /// A memory note.
    Note,
    /// Extracted video/audio transcript.
    Transcript,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::UploadedFile => write!(f, "file"),
            SourceKind::Url => write!(f, "url"),
            SourceKind::Note => write!(f, "note"),
            SourceKind::Transcript => write!(f, "transcript"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "uploadedfile" => Ok(SourceKind::UploadedFile),
            "url" => Ok(SourceKind::Url),
            "note" => Ok(SourceKind::Note),
            "transcript" => Ok(SourceKind::Transcript),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

/// A raw text source, immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Unique source ID.
    pub id: Uuid,
    /// What kind of source this is.
    pub kind: SourceKind,
    /// Display title (filename, URL, note title, video title).
    pub title: String,
    /// The raw text, exactly as ingested.
    pub text: String,
    /// Language of the text, when known.
    pub language: Option<Language>,
    /// When the source was ingested.
    pub created_at: DateTime<Utc>,
}

impl SourceDocument {
    /// Create a new source document with a fresh ID.
    pub fn new(kind: SourceKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            text: text.into(),
            language: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a known language tag.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// A note in the memory partition.
///
/// Notes are append-only: amending a note stores a new one and marks the
/// old one superseded rather than editing in place, so cached embeddings
/// never go silently stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    /// Unique note ID (same as its SourceDocument ID).
    pub id: Uuid,
    /// Optional short title.
    pub title: Option<String>,
    /// Note text.
    pub text: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// When the note was stored.
    pub created_at: DateTime<Utc>,
    /// Set when a newer note replaces this one.
    pub superseded_by: Option<Uuid>,
}

impl MemoryNote {
    /// Create a new note.
    pub fn new(title: Option<String>, text: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            text: text.into(),
            tags,
            created_at: Utc::now(),
            superseded_by: None,
        }
    }

    /// Title for display: the explicit title, or the first few words of
    /// the note.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self
                .text
                .split_whitespace()
                .take(6)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Render the note as indexable text, folding the title and tags in so
    /// recall can match on them too.
    pub fn indexable_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(title.clone());
        }
        parts.push(self.text.clone());
        if !self.tags.is_empty() {
            parts.push(self.tags.join(", "));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_roundtrip() {
        for kind in [
            SourceKind::UploadedFile,
            SourceKind::Url,
            SourceKind::Note,
            SourceKind::Transcript,
        ] {
            let parsed: SourceKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_note_indexable_text() {
        let note = MemoryNote::new(
            Some("Groceries".to_string()),
            "buy milk",
            vec!["errand".to_string()],
        );
        let text = note.indexable_text();
        assert!(text.contains("Groceries"));
        assert!(text.contains("buy milk"));
        assert!(text.contains("errand"));
    }
}
