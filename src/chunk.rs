//! Sliding-window chunker.
//!
//! Splits extracted content into overlapping fixed-size windows: by
//! character for text, by element for caption sequences. Chunks that are
//! empty after trimming are dropped, so whitespace-only stub windows at the
//! tail never reach the index.

use anyhow::{bail, Result};

use crate::models::{Caption, DocContent};

/// Window parameters. Constructing via [`ChunkParams::new`] is the only
/// validation gate: `overlap >= size` would stall the window advance, so it
/// is rejected up front instead of looping forever.
#[derive(Debug, Clone, Copy)]
pub struct ChunkParams {
    pub size: usize,
    pub overlap: usize,
}

impl ChunkParams {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            bail!("chunk size must be > 0");
        }
        if overlap >= size {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap,
                size
            );
        }
        Ok(Self { size, overlap })
    }
}

/// Chunk a document's content with the appropriate index unit.
pub fn chunk_document(content: &DocContent, params: &ChunkParams) -> Vec<String> {
    match content {
        DocContent::Text(text) => chunk_text(text, params),
        DocContent::Captions(caps) => chunk_captions(caps, params),
    }
}

/// Character-windowed text chunks. Windows advance by `size - overlap`;
/// the last window ends the walk once it reaches the end of the text.
pub fn chunk_text(text: &str, params: &ChunkParams) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end, so windows never
    // split a multi-byte character.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());
    let n = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut i = 0usize;
    while i < n {
        let end = (i + params.size).min(n);
        let piece = text[bounds[i]..bounds[end]].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        if i + params.size >= n {
            break;
        }
        i += params.size - params.overlap;
    }
    chunks
}

/// Element-windowed caption chunks, rendered to newline-joined text.
pub fn chunk_captions(captions: &[Caption], params: &ChunkParams) -> Vec<String> {
    let n = captions.len();
    let mut chunks = Vec::new();
    let mut i = 0usize;
    while i < n {
        let end = (i + params.size).min(n);
        let text = render_captions(&captions[i..end]);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if i + params.size >= n {
            break;
        }
        i += params.size - params.overlap;
    }
    chunks
}

/// Join caption texts with newlines for indexing.
pub fn render_captions(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(size: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(size, overlap).unwrap()
    }

    fn cap(text: &str) -> Caption {
        Caption {
            text: text.to_string(),
            start: None,
            end: None,
        }
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(ChunkParams::new(100, 100).is_err());
        assert!(ChunkParams::new(100, 150).is_err());
        assert!(ChunkParams::new(0, 0).is_err());
        assert!(ChunkParams::new(100, 99).is_ok());
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", &params(1200, 150)).is_empty());
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunks = chunk_text("hello", &params(1200, 150));
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn test_exact_window_yields_single_chunk() {
        let text = "x".repeat(1200);
        let chunks = chunk_text(&text, &params(1200, 150));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 1200);
    }

    #[test]
    fn test_1300_chars_yields_two_chunks() {
        let text = "x".repeat(1300);
        let chunks = chunk_text(&text, &params(1200, 150));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 1200);
        assert_eq!(chunks[1].len(), 250);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_chunk_count_matches_window_formula() {
        // For solid content longer than the overlap, the count is
        // ceil((L - O) / (S - O)).
        for (len, size, overlap) in [(1300, 1200, 150), (5000, 1200, 150), (10, 4, 1), (9, 3, 0)] {
            let text = "x".repeat(len);
            let chunks = chunk_text(&text, &params(size, overlap));
            let expected = (len - overlap).div_ceil(size - overlap);
            assert_eq!(chunks.len(), expected, "L={} S={} O={}", len, size, overlap);
        }
    }

    #[test]
    fn test_whitespace_tail_window_is_dropped() {
        // "ab" then spaces; the stub windows contain only whitespace.
        let text = format!("ab{}", " ".repeat(6));
        let chunks = chunk_text(&text, &params(3, 1));
        assert_eq!(chunks, vec!["ab".to_string()]);
    }

    #[test]
    fn test_whitespace_only_text_yields_no_chunks() {
        assert!(chunk_text("   \n\t  ", &params(1200, 150)).is_empty());
    }

    #[test]
    fn test_multibyte_text_does_not_split_characters() {
        let text = "é".repeat(10);
        let chunks = chunk_text(&text, &params(4, 1));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "é".repeat(4));
    }

    #[test]
    fn test_caption_windows_by_element() {
        let caps = vec![cap("one"), cap("two"), cap("three")];
        let chunks = chunk_captions(&caps, &params(2, 1));
        assert_eq!(chunks, vec!["one\ntwo".to_string(), "two\nthree".to_string()]);
    }

    #[test]
    fn test_caption_sequence_shorter_than_window() {
        let caps = vec![cap("only")];
        let chunks = chunk_captions(&caps, &params(50, 10));
        assert_eq!(chunks, vec!["only".to_string()]);
    }

    #[test]
    fn test_empty_caption_sequence() {
        assert!(chunk_captions(&[], &params(50, 10)).is_empty());
    }
}
