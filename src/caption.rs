//! WebVTT and SRT caption parsing.
//!
//! [`parse_captions`] handles well-formed files from both formats by keying
//! on the `-->` timing line of each cue. When a file is too broken to yield
//! any cue, [`read_caption_content`] falls back to a degraded plain-text
//! pass that strips header, cue-number, and timing lines and returns the
//! remainder as a single untimed caption. The fallback never fails.

use std::time::Duration;

use anyhow::{bail, Result};

use crate::models::Caption;

/// Parse caption content, falling back to degraded plain-text extraction
/// when no structured cue can be recovered.
pub fn read_caption_content(raw: &str) -> Vec<Caption> {
    match parse_captions(raw) {
        Ok(cues) => cues,
        Err(_) => fallback_plain(raw),
    }
}

/// Structured parse: every block containing a `A --> B` line becomes one
/// cue whose text is the run of non-blank lines below it.
///
/// Returns an error when the input yields zero cues, so the caller can
/// fall back.
pub fn parse_captions(raw: &str) -> Result<Vec<Caption>> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut cues = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        match parse_cue_timing(lines[i].trim()) {
            Some((start, end)) => {
                let mut text_lines = Vec::new();
                i += 1;
                while i < lines.len() && !lines[i].trim().is_empty() {
                    text_lines.push(lines[i].trim());
                    i += 1;
                }
                let text = text_lines.join("\n");
                if !text.is_empty() {
                    cues.push(Caption { text, start, end });
                }
            }
            None => i += 1,
        }
    }

    if cues.is_empty() {
        bail!("no caption cues found");
    }
    Ok(cues)
}

/// Degraded extraction for broken caption files: strip the WEBVTT header,
/// bare cue-number lines, and any timing line, collapse blank runs, and
/// return the remainder as one caption with no timing.
fn fallback_plain(raw: &str) -> Vec<Caption> {
    let kept: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| {
            !l.is_empty()
                && !l.starts_with("WEBVTT")
                && !l.contains("-->")
                && !l.chars().all(|c| c.is_ascii_digit())
        })
        .collect();

    let text = kept.join("\n");
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Caption {
            text,
            start: None,
            end: None,
        }]
    }
}

/// A cue timing line splits on `-->`. Timestamps that fail to parse leave
/// the corresponding bound absent rather than discarding the cue.
fn parse_cue_timing(line: &str) -> Option<(Option<Duration>, Option<Duration>)> {
    let (lhs, rhs) = line.split_once("-->")?;
    let start = parse_timestamp(lhs);
    // Cue settings may trail the end timestamp ("... align:start").
    let end = parse_timestamp(rhs.split_whitespace().next().unwrap_or(""));
    Some((start, end))
}

/// Parse `HH:MM:SS.mmm` (VTT), `HH:MM:SS,mmm` (SRT), or the short
/// `MM:SS.mmm` form.
fn parse_timestamp(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (clock, frac) = match s.split_once(['.', ',']) {
        Some((c, f)) => (c, f),
        None => (s, "0"),
    };
    let millis: u64 = frac.parse().ok()?;

    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, sec): (u64, u64, u64) = match parts.as_slice() {
        [h, m, s] => (h.parse().ok()?, m.parse().ok()?, s.parse().ok()?),
        [m, s] => (0, m.parse().ok()?, s.parse().ok()?),
        _ => return None,
    };
    if m >= 60 || sec >= 60 {
        return None;
    }
    Some(Duration::from_millis(((h * 60 + m) * 60 + sec) * 1000 + millis))
}
