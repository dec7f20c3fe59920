//! Core data models used throughout the harness.
//!
//! These types represent the extracted documents, captions, and candidate
//! chunks that flow through the ingestion and retrieval pipeline.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

/// Resolved document type tag, recorded in every chunk's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Pdf,
    Vtt,
    Srt,
    Text,
    Code,
    VideoTranscript,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Pdf => "pdf",
            DocType::Vtt => "vtt",
            DocType::Srt => "srt",
            DocType::Text => "text",
            DocType::Code => "code",
            DocType::VideoTranscript => "video_transcript",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single caption cue from a `.vtt`/`.srt` file.
///
/// `start`/`end` are `None` when timing could not be parsed (degraded
/// fallback extraction).
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub start: Option<Duration>,
    pub end: Option<Duration>,
}

/// Metadata attached to every successful extraction.
#[derive(Debug, Clone, Serialize)]
pub struct DocMeta {
    /// Absolute path of the source file. For videos this is the video
    /// itself, not the sidecar transcript it delegated to.
    pub source: String,
    pub name: String,
    pub parent: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
}

impl DocMeta {
    pub fn new(path: &Path, doc_type: DocType) -> Self {
        Self {
            source: path.display().to_string(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            parent: path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            doc_type,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Extracted content: plain text, or an ordered caption sequence.
#[derive(Debug, Clone)]
pub enum DocContent {
    Text(String),
    Captions(Vec<Caption>),
}

impl DocContent {
    pub fn is_empty(&self) -> bool {
        match self {
            DocContent::Text(t) => t.trim().is_empty(),
            DocContent::Captions(c) => c.iter().all(|cap| cap.text.trim().is_empty()),
        }
    }

    /// Flatten to plain text (caption texts joined with newlines).
    pub fn to_text(&self) -> String {
        match self {
            DocContent::Text(t) => t.clone(),
            DocContent::Captions(caps) => caps
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// The result of extracting one file.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub content: DocContent,
    pub meta: DocMeta,
}

/// A candidate chunk ready for dedup filtering and indexing.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub meta: DocMeta,
}

/// Deterministic chunk key: `<relative-posix-path>::chunk-<0000>`.
///
/// The path is taken relative to the ingestion root's parent directory, so
/// a root named `data` yields IDs like `data/pdfs/guide.pdf::chunk-0003`.
/// Files outside the root fall back to their absolute path. Identical
/// `(path, index)` always yields the identical ID.
pub fn chunk_id(path: &Path, root: &Path, index: usize) -> String {
    let base = root.parent().unwrap_or(root);
    let rel = path.strip_prefix(base).unwrap_or(path);
    let posix = rel.to_string_lossy().replace('\\', "/");
    format!("{}::chunk-{:04}", posix, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_chunk_id_relative_to_root_parent() {
        let root = PathBuf::from("/kb/data");
        let file = PathBuf::from("/kb/data/pdfs/guide.pdf");
        assert_eq!(chunk_id(&file, &root, 3), "data/pdfs/guide.pdf::chunk-0003");
    }

    #[test]
    fn test_chunk_id_zero_padding() {
        let root = PathBuf::from("/kb/data");
        let file = PathBuf::from("/kb/data/a.txt");
        assert_eq!(chunk_id(&file, &root, 0), "data/a.txt::chunk-0000");
        assert_eq!(chunk_id(&file, &root, 12), "data/a.txt::chunk-0012");
        assert_eq!(chunk_id(&file, &root, 10_000), "data/a.txt::chunk-10000");
    }

    #[test]
    fn test_chunk_id_outside_root_uses_full_path() {
        let root = PathBuf::from("/kb/data");
        let file = PathBuf::from("/elsewhere/notes.txt");
        assert_eq!(chunk_id(&file, &root, 1), "/elsewhere/notes.txt::chunk-0001");
    }

    #[test]
    fn test_chunk_id_deterministic() {
        let root = PathBuf::from("/kb/data");
        let file = PathBuf::from("/kb/data/talk.mp4");
        assert_eq!(chunk_id(&file, &root, 7), chunk_id(&file, &root, 7));
    }

    #[test]
    fn test_doc_meta_json_shape() {
        let meta = DocMeta::new(Path::new("/kb/data/talk.mp4"), DocType::VideoTranscript);
        let json = meta.to_json();
        assert_eq!(json["type"], "video_transcript");
        assert_eq!(json["name"], "talk.mp4");
        assert_eq!(json["parent"], "/kb/data");
        assert_eq!(json["source"], "/kb/data/talk.mp4");
    }

    #[test]
    fn test_content_emptiness() {
        assert!(DocContent::Text("   \n".to_string()).is_empty());
        assert!(!DocContent::Text("x".to_string()).is_empty());
        assert!(DocContent::Captions(Vec::new()).is_empty());
    }
}
