//! Directory walk and sidecar resolution.
//!
//! Candidate collection is a pure pass over the tree: it produces the full
//! list of `(chunk, metadata, id)` records and touches no store. Dedup and
//! batching happen downstream in the ingestion coordinator.
//!
//! Two passes are required: whether a caption file is consumed by a sibling
//! video depends on which files exist anywhere in the tree, which is only
//! knowable after a full scan.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::chunk::{chunk_document, ChunkParams};
use crate::config::IngestConfig;
use crate::extract::{classify, extract, find_sidecar, DocKind};
use crate::models::{chunk_id, ChunkRecord};

/// Tooling, VCS, and cache directories skipped anywhere in the path.
const SKIP_DIRS: [&str; 6] = [".git", ".venv", "venv", "__pycache__", "node_modules", "target"];

/// Outcome of a candidate-collection pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: Vec<ChunkRecord>,
    /// Files visited in the processing pass (after directory skips).
    pub files_seen: usize,
    /// Unsupported extension, video without transcript, or empty content.
    pub skipped_empty: usize,
    /// Caption files consumed by a sibling video.
    pub sidecars_consumed: usize,
    /// Files dropped by the exclusion list or glob patterns.
    pub excluded: usize,
    /// Per-file extraction failures (warned, never fatal).
    pub failed: usize,
}

/// Walk `root` and collect every candidate chunk record.
pub fn collect_candidates(
    root: &Path,
    ingest: &IngestConfig,
    params: &ChunkParams,
) -> Result<ScanReport> {
    if !root.exists() {
        bail!("ingest root does not exist: {}", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve ingest root {}", root.display()))?;

    let consumed = discover_consumed_sidecars(&root);
    let excluded_paths = resolve_excluded_paths(&root, &ingest.exclude_files);
    let exclude_globs = build_globset(&ingest.exclude_globs)?;

    let mut report = ScanReport::default();

    // Deterministic order keeps batching and progress output stable.
    let mut files = walk_files(&root);
    files.sort();

    for path in files {
        report.files_seen += 1;

        if consumed.contains(&path) {
            report.sidecars_consumed += 1;
            continue;
        }
        if excluded_paths.contains(&path) || matches_glob(&exclude_globs, &root, &path) {
            report.excluded += 1;
            continue;
        }

        let doc = match extract(&path) {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                report.skipped_empty += 1;
                continue;
            }
            Err(e) => {
                eprintln!("Warning: failed to extract {}: {:#}", path.display(), e);
                report.failed += 1;
                continue;
            }
        };
        if doc.content.is_empty() {
            report.skipped_empty += 1;
            continue;
        }

        let chunks = chunk_document(&doc.content, params);
        if chunks.is_empty() {
            report.skipped_empty += 1;
            continue;
        }
        for (index, text) in chunks.into_iter().enumerate() {
            report.candidates.push(ChunkRecord {
                id: chunk_id(&path, &root, index),
                text,
                meta: doc.meta.clone(),
            });
        }
    }

    Ok(report)
}

/// Discovery pass: record the sidecar attached to every video so the
/// processing pass does not index it a second time. Only the first match
/// per video (`.vtt` before `.srt`) is consumed.
fn discover_consumed_sidecars(root: &Path) -> HashSet<PathBuf> {
    let mut consumed = HashSet::new();
    for path in walk_files(root) {
        if classify(&path) == Some(DocKind::Video) {
            if let Some(sidecar) = find_sidecar(&path) {
                consumed.insert(sidecar);
            }
        }
    }
    consumed
}

/// All regular files under `root`, with tooling directories pruned.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e.path(), root))
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect()
}

fn is_skipped_dir(path: &Path, root: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        SKIP_DIRS.contains(&name.as_ref())
    })
}

/// Resolve the explicit exclusion list to absolute paths. Relative entries
/// are taken against the root's parent directory, matching the ID scheme
/// (`data/pdfs/ticket.pdf` excludes that file under root `data`).
fn resolve_excluded_paths(root: &Path, exclude_files: &[PathBuf]) -> HashSet<PathBuf> {
    let base = root.parent().unwrap_or(root);
    exclude_files
        .iter()
        .map(|p| {
            let abs = if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            };
            abs.canonicalize().unwrap_or(abs)
        })
        .collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern).with_context(|| format!("invalid exclude glob: {}", pattern))?,
        );
    }
    Ok(builder.build()?)
}

fn matches_glob(set: &GlobSet, root: &Path, path: &Path) -> bool {
    if set.is_empty() {
        return false;
    }
    let rel = path.strip_prefix(root).unwrap_or(path);
    set.is_match(rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VTT: &str = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nspoken words here\n";

    fn ingest_config(root: &Path) -> IngestConfig {
        IngestConfig {
            root: root.to_path_buf(),
            batch_size: 100,
            exclude_files: Vec::new(),
            exclude_globs: Vec::new(),
        }
    }

    fn small_params() -> ChunkParams {
        ChunkParams::new(1200, 150).unwrap()
    }

    fn setup_root(tmp: &TempDir) -> PathBuf {
        let root = tmp.path().join("data");
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("absent");
        let err = collect_candidates(&root, &ingest_config(&root), &small_params());
        assert!(err.is_err());
    }

    #[test]
    fn test_collects_text_candidates_with_ids() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("a.txt"), "x".repeat(1300)).unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        let ids: Vec<&str> = report.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["data/a.txt::chunk-0000", "data/a.txt::chunk-0001"]);
        assert_eq!(report.candidates[0].text.len(), 1200);
    }

    #[test]
    fn test_sidecar_consumed_not_indexed_twice() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("talk.mp4"), b"binary").unwrap();
        fs::write(root.join("talk.vtt"), VTT).unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        assert_eq!(report.sidecars_consumed, 1);
        assert_eq!(report.candidates.len(), 1);
        let only = &report.candidates[0];
        assert!(only.id.starts_with("data/talk.mp4::chunk-"));
        assert_eq!(only.meta.doc_type.as_str(), "video_transcript");
        assert!(only.meta.source.ends_with("talk.mp4"));
    }

    #[test]
    fn test_second_sidecar_remains_indexable() {
        // Only the .vtt is consumed by the video; the .srt stays eligible.
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("talk.mp4"), b"binary").unwrap();
        fs::write(root.join("talk.vtt"), VTT).unwrap();
        fs::write(
            root.join("talk.srt"),
            "1\n00:00:00,000 --> 00:00:02,000\nsame words\n",
        )
        .unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        let types: Vec<&str> = report
            .candidates
            .iter()
            .map(|c| c.meta.doc_type.as_str())
            .collect();
        assert!(types.contains(&"video_transcript"));
        assert!(types.contains(&"srt"));
        assert!(!types.contains(&"vtt"));
    }

    #[test]
    fn test_tooling_directories_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("__pycache__")).unwrap();
        fs::write(root.join(".git").join("config.txt"), "not docs").unwrap();
        fs::write(root.join("__pycache__").join("x.txt"), "not docs").unwrap();
        fs::write(root.join("real.txt"), "real content").unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert!(report.candidates[0].id.contains("real.txt"));
    }

    #[test]
    fn test_exclusion_list_respected() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("keep.txt"), "kept").unwrap();
        fs::write(root.join("drop.txt"), "dropped").unwrap();

        let mut cfg = ingest_config(&root);
        cfg.exclude_files = vec![PathBuf::from("data/drop.txt")];

        let report = collect_candidates(&root, &cfg, &small_params()).unwrap();
        assert_eq!(report.excluded, 1);
        assert_eq!(report.candidates.len(), 1);
        assert!(report.candidates[0].id.contains("keep.txt"));
    }

    #[test]
    fn test_exclude_globs_respected() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join("drafts").join("wip.md"), "draft").unwrap();
        fs::write(root.join("final.md"), "final").unwrap();

        let mut cfg = ingest_config(&root);
        cfg.exclude_globs = vec!["drafts/**".to_string()];

        let report = collect_candidates(&root, &cfg, &small_params()).unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert!(report.candidates[0].id.contains("final.md"));
    }

    #[test]
    fn test_unsupported_and_empty_files_counted_not_failed() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("b.bin"), b"\x00\x01").unwrap();
        fs::write(root.join("empty.txt"), "").unwrap();
        fs::write(root.join("lonely.mp4"), b"no transcript").unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        assert_eq!(report.candidates.len(), 0);
        assert_eq!(report.skipped_empty, 3);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_corrupt_pdf_does_not_abort_scan() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("bad.pdf"), b"not a pdf").unwrap();
        fs::write(root.join("good.txt"), "still ingested").unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.candidates.len(), 1);
        assert!(report.candidates[0].id.contains("good.txt"));
    }

    #[test]
    fn test_broken_vtt_still_yields_candidates() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("broken.vtt"), "WEBVTT\n\n1\nHello fallback.\n").unwrap();

        let report = collect_candidates(&root, &ingest_config(&root), &small_params()).unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].meta.doc_type.as_str(), "vtt");
        assert!(report.candidates[0].text.contains("Hello fallback."));
    }

    #[test]
    fn test_ordinals_increase_within_document() {
        let tmp = TempDir::new().unwrap();
        let root = setup_root(&tmp);
        fs::write(root.join("long.txt"), "y".repeat(4000)).unwrap();

        let params = ChunkParams::new(1000, 100).unwrap();
        let report = collect_candidates(&root, &ingest_config(&root), &params).unwrap();
        for (i, rec) in report.candidates.iter().enumerate() {
            assert_eq!(rec.id, format!("data/long.txt::chunk-{:04}", i));
        }
    }
}
