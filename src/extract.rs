//! Format-aware document extraction.
//!
//! Dispatch is by lower-cased file extension over the closed [`DocKind`]
//! set, one handler per variant. Returning `Ok(None)` means "nothing to
//! index here" (unsupported extension, video without a transcript sidecar);
//! it is an expected outcome, not an error. Real read/parse failures are
//! returned as errors and handled at the per-file boundary by the scanner.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::caption::read_caption_content;
use crate::models::{DocContent, DocMeta, DocType, ExtractedDocument};

/// Closed set of supported input formats. Adding a format means adding a
/// variant here and a handler arm in [`extract`], checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Pdf,
    Caption,
    Text,
    Code,
    Video,
}

/// Sidecar probe order: `.vtt` wins over `.srt` when both exist.
const SIDECAR_EXTS: [&str; 2] = ["vtt", "srt"];

/// Classify a path by its lower-cased extension. `None` = unsupported.
pub fn classify(path: &Path) -> Option<DocKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "pdf" => Some(DocKind::Pdf),
        "vtt" | "srt" => Some(DocKind::Caption),
        "txt" | "md" | "rst" => Some(DocKind::Text),
        "py" | "sh" => Some(DocKind::Code),
        "mp4" | "mov" | "mkv" => Some(DocKind::Video),
        _ => None,
    }
}

/// Locate the transcript sidecar consumed by a video: same stem, `.vtt`
/// preferred over `.srt`, first match only.
pub fn find_sidecar(video: &Path) -> Option<PathBuf> {
    SIDECAR_EXTS
        .iter()
        .map(|ext| video.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Extract a file into content plus metadata.
///
/// `Ok(None)` signals "skip this file". Extraction never mutates the
/// filesystem; videos are never opened, only their sidecars.
pub fn extract(path: &Path) -> Result<Option<ExtractedDocument>> {
    let kind = match classify(path) {
        Some(k) => k,
        None => return Ok(None),
    };

    let doc = match kind {
        DocKind::Pdf => ExtractedDocument {
            content: DocContent::Text(extract_pdf(path)?),
            meta: DocMeta::new(path, DocType::Pdf),
        },
        DocKind::Caption => {
            let doc_type = caption_doc_type(path);
            ExtractedDocument {
                content: DocContent::Captions(extract_captions(path)?),
                meta: DocMeta::new(path, doc_type),
            }
        }
        DocKind::Text => ExtractedDocument {
            content: DocContent::Text(read_text_lossy(path)?),
            meta: DocMeta::new(path, DocType::Text),
        },
        DocKind::Code => ExtractedDocument {
            content: DocContent::Text(read_text_lossy(path)?),
            meta: DocMeta::new(path, DocType::Code),
        },
        DocKind::Video => {
            let sidecar = match find_sidecar(path) {
                Some(s) => s,
                // No transcript: the video binary is skipped entirely.
                None => return Ok(None),
            };
            ExtractedDocument {
                content: DocContent::Captions(extract_captions(&sidecar)?),
                // Attributed to the video, not the sidecar.
                meta: DocMeta::new(path, DocType::VideoTranscript),
            }
        }
    };

    Ok(Some(doc))
}

fn caption_doc_type(path: &Path) -> DocType {
    match path.extension().map(|e| e.to_string_lossy().to_lowercase()) {
        Some(ext) if ext == "srt" => DocType::Srt,
        _ => DocType::Vtt,
    }
}

/// Per-page PDF text joined with newlines. Pages without extractable text
/// contribute empty strings; a document-level parse failure is an error the
/// scanner recovers from.
fn extract_pdf(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .with_context(|| format!("failed to extract PDF text from {}", path.display()))?;
    Ok(pages.join("\n").trim().to_string())
}

fn extract_captions(path: &Path) -> Result<Vec<crate::models::Caption>> {
    let raw = read_text_lossy(path)?;
    Ok(read_caption_content(&raw))
}

/// Tolerant text read: invalid UTF-8 sequences are replaced, never fatal.
fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify(Path::new("a.PDF")), Some(DocKind::Pdf));
        assert_eq!(classify(Path::new("a.vtt")), Some(DocKind::Caption));
        assert_eq!(classify(Path::new("a.srt")), Some(DocKind::Caption));
        assert_eq!(classify(Path::new("a.md")), Some(DocKind::Text));
        assert_eq!(classify(Path::new("a.py")), Some(DocKind::Code));
        assert_eq!(classify(Path::new("a.MKV")), Some(DocKind::Video));
        assert_eq!(classify(Path::new("a.bin")), None);
        assert_eq!(classify(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_extension_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blob.bin");
        fs::write(&path, b"\x00\x01\x02").unwrap();
        assert!(extract(&path).unwrap().is_none());
    }

    #[test]
    fn test_text_file_extraction() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.md");
        fs::write(&path, "# Notes\nreset the router").unwrap();
        let doc = extract(&path).unwrap().unwrap();
        assert_eq!(doc.meta.doc_type, DocType::Text);
        assert_eq!(doc.meta.name, "notes.md");
        assert!(doc.content.to_text().contains("reset the router"));
    }

    #[test]
    fn test_code_file_tagged_code() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fix.sh");
        fs::write(&path, "#!/bin/sh\necho ok\n").unwrap();
        let doc = extract(&path).unwrap().unwrap();
        assert_eq!(doc.meta.doc_type, DocType::Code);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mixed.txt");
        fs::write(&path, b"valid \xff\xfe invalid").unwrap();
        let doc = extract(&path).unwrap().unwrap();
        assert!(doc.content.to_text().contains("valid"));
        assert!(doc.content.to_text().contains("invalid"));
    }

    #[test]
    fn test_video_without_sidecar_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("talk.mp4");
        fs::write(&path, b"not really video bytes").unwrap();
        assert!(extract(&path).unwrap().is_none());
    }

    #[test]
    fn test_video_with_vtt_sidecar_yields_transcript() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("talk.mp4");
        fs::write(&video, b"binary").unwrap();
        fs::write(
            tmp.path().join("talk.vtt"),
            "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\ntranscript words\n",
        )
        .unwrap();

        let doc = extract(&video).unwrap().unwrap();
        assert_eq!(doc.meta.doc_type, DocType::VideoTranscript);
        assert_eq!(doc.meta.name, "talk.mp4");
        assert!(doc.content.to_text().contains("transcript words"));
    }

    #[test]
    fn test_sidecar_prefers_vtt_over_srt() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("talk.mov");
        fs::write(&video, b"binary").unwrap();
        fs::write(
            tmp.path().join("talk.vtt"),
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nfrom the vtt\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("talk.srt"),
            "1\n00:00:00,000 --> 00:00:01,000\nfrom the srt\n",
        )
        .unwrap();

        let doc = extract(&video).unwrap().unwrap();
        assert!(doc.content.to_text().contains("from the vtt"));
        assert!(!doc.content.to_text().contains("from the srt"));
    }

    #[test]
    fn test_corrupt_pdf_is_an_error_not_a_panic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();
        assert!(extract(&path).is_err());
    }
}
