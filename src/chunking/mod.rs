//! Text chunking for indexing.
//!
//! Splits raw source text into bounded, overlapping segments — the unit of
//! embedding and retrieval. The window slides by `max_chars - overlap_chars`
//! so consecutive chunks share `overlap_chars` of context, and the
//! non-overlapping spans concatenate back to the original text exactly.
//! Offsets are measured in characters, not bytes, so they are stable across
//! any UTF-8 text.

use crate::error::{NovaError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded text segment derived from a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// The source document this chunk was cut from.
    pub source_id: Uuid,
    /// Position of this chunk within its source, starting at 0.
    pub seq: u32,
    /// The chunk text, including overlap with its neighbours.
    pub text: String,
    /// Start offset into the source text, in characters (inclusive).
    pub start_char: usize,
    /// End offset into the source text, in characters (exclusive).
    pub end_char: usize,
}

/// Chunker configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Characters of overlap between consecutive chunks.
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            overlap_chars: 200,
        }
    }
}

impl ChunkConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(NovaError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(NovaError::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.max_chars - self.overlap_chars
    }
}

/// Split source text into overlapping chunks.
///
/// Empty text yields an empty sequence. Text no longer than the window
/// yields exactly one chunk.
pub fn chunk_text(source_id: Uuid, text: &str, config: &ChunkConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char, plus a sentinel at the end, so char
    // ranges can be sliced without re-walking the string.
    let byte_offsets: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = byte_offsets.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut seq = 0u32;

    loop {
        let end = (start + config.max_chars).min(char_len);
        chunks.push(Chunk {
            id: Uuid::new_v4(),
            source_id,
            seq,
            text: text[byte_offsets[start]..byte_offsets[end]].to_string(),
            start_char: start,
            end_char: end,
        });

        if end == char_len {
            break;
        }
        start += config.step();
        seq += 1;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max: usize, overlap: usize) -> ChunkConfig {
        ChunkConfig {
            max_chars: max,
            overlap_chars: overlap,
        }
    }

    /// Concatenate the non-overlapping spans of a chunk sequence.
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0usize;
        for chunk in chunks {
            let skip = covered.saturating_sub(chunk.start_char);
            out.extend(chunk.text.chars().skip(skip));
            covered = chunk.end_char;
        }
        out
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunks = chunk_text(Uuid::new_v4(), "", &cfg(100, 10)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_text_yields_one_chunk() {
        let chunks = chunk_text(Uuid::new_v4(), "hello world", &cfg(100, 10)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello world");
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, 11);
    }

    #[test]
    fn test_spec_example_offsets() {
        // 500-char window, 50-char overlap, 1200 chars of input.
        let text: String = std::iter::repeat('a').take(1200).collect();
        let chunks = chunk_text(Uuid::new_v4(), &text, &cfg(500, 50)).unwrap();

        let offsets: Vec<(usize, usize)> =
            chunks.iter().map(|c| (c.start_char, c.end_char)).collect();
        assert_eq!(offsets, vec![(0, 500), (450, 950), (900, 1200)]);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.seq as usize, i);
        }
    }

    #[test]
    fn test_lossless_reconstruction() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunks = chunk_text(Uuid::new_v4(), &text, &cfg(128, 32)).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_lossless_reconstruction_multibyte() {
        let text = "नमस्ते दुनिया। ありがとう。çà et là. ".repeat(25);
        let chunks = chunk_text(Uuid::new_v4(), &text, &cfg(64, 16)).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "abcdefghij".repeat(20);
        let chunks = chunk_text(Uuid::new_v4(), &text, &cfg(50, 10)).unwrap();
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_char - pair[1].start_char, 10);
        }
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let err = chunk_text(Uuid::new_v4(), "text", &cfg(100, 100)).unwrap_err();
        assert!(matches!(err, NovaError::InvalidConfig(_)));

        let err = chunk_text(Uuid::new_v4(), "text", &cfg(100, 150)).unwrap_err();
        assert!(matches!(err, NovaError::InvalidConfig(_)));
    }

    #[test]
    fn test_exact_window_boundary() {
        // Text ending exactly on a window edge must not produce an empty
        // trailing chunk.
        let text: String = std::iter::repeat('x').take(950).collect();
        let chunks = chunk_text(Uuid::new_v4(), &text, &cfg(500, 50)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].start_char, 450);
        assert_eq!(chunks[1].end_char, 950);
    }
}
