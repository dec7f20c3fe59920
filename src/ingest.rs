//! Ingestion coordination.
//!
//! Runs the full flow: candidate collection → one bulk read of existing
//! IDs → dedup filter → batched adds → summary counts. The store is never
//! read per item, and existing records are never overwritten or
//! re-embedded.
//!
//! Running twice against an unchanged tree and store indexes zero new
//! records on the second run: chunk IDs are deterministic, so every
//! candidate is filtered out by the dedup step.

use anyhow::Result;

use crate::config::Config;
use crate::scan;
use crate::store::Collection;

/// Per-run counts, printed and returned.
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Candidate chunks produced by the scan.
    pub found: usize,
    /// Candidates whose ID was already present in the store.
    pub skipped_existing: usize,
    /// Candidates actually submitted and accepted.
    pub newly_indexed: usize,
    /// Batches whose add call failed (retryable by re-running).
    pub failed_batches: usize,
    /// Store record total after the run.
    pub total_records: u64,
}

pub async fn run_ingest(
    config: &Config,
    collection: &dyn Collection,
    dry_run: bool,
) -> Result<IngestSummary> {
    let params = config.chunking.params()?;
    let report = scan::collect_candidates(&config.ingest.root, &config.ingest, &params)?;

    let mut summary = IngestSummary {
        found: report.candidates.len(),
        ..Default::default()
    };

    println!("ingest {}", config.ingest.root.display());
    println!("  files seen: {}", report.files_seen);
    println!("  unsupported or empty: {}", report.skipped_empty);
    println!("  sidecars consumed: {}", report.sidecars_consumed);
    println!("  excluded: {}", report.excluded);
    println!("  extraction failed: {}", report.failed);
    println!("  candidate chunks: {}", report.candidates.len());

    if report.candidates.is_empty() {
        println!(
            "No ingestible files found under {}",
            config.ingest.root.display()
        );
        return Ok(summary);
    }

    if dry_run {
        println!("dry-run, nothing written");
        return Ok(summary);
    }

    // One bulk read. A failure here does not abort the run: the index is
    // treated as empty, which can re-add existing records, so say so.
    let existing = match collection.ids().await {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!(
                "Warning: could not read existing IDs ({:#}); assuming an empty index. \
                 Records already present may be indexed again.",
                e
            );
            Default::default()
        }
    };

    let new_items: Vec<_> = report
        .candidates
        .iter()
        .filter(|r| !existing.contains(&r.id))
        .collect();
    summary.skipped_existing = summary.found - new_items.len();

    println!("  already indexed: {}", summary.skipped_existing);

    if new_items.is_empty() {
        println!("No new chunks to index");
    } else {
        println!("Indexing {} new chunks...", new_items.len());
    }

    for (batch_no, batch) in new_items.chunks(config.ingest.batch_size).enumerate() {
        let records: Vec<_> = batch.iter().map(|r| (*r).clone()).collect();
        match collection.add(&records).await {
            Ok(()) => {
                summary.newly_indexed += records.len();
                println!(
                    "Indexed {} / {} new chunks...",
                    summary.newly_indexed,
                    new_items.len()
                );
            }
            Err(e) => {
                summary.failed_batches += 1;
                eprintln!(
                    "Warning: batch {} ({} chunks) failed to index: {:#}",
                    batch_no + 1,
                    records.len(),
                    e
                );
            }
        }
    }

    summary.total_records = collection.count().await.unwrap_or(0);

    println!("  newly indexed: {}", summary.newly_indexed);
    if summary.failed_batches > 0 {
        println!("  failed batches: {}", summary.failed_batches);
    }
    println!(
        "Ingest complete. {} total records in '{}'.",
        summary.total_records, config.store.collection
    );
    println!("ok");

    Ok(summary)
}
