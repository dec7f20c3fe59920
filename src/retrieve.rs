//! Retrieval against the indexed collection.
//!
//! A ticket document is extracted with the same extractor as ingestion,
//! the collection is queried for the nearest chunks, and results are
//! passed downstream in the store's rank order. No re-ranking happens
//! here. Zero matches is an explicit empty result, not an error.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::extract::extract;
use crate::llm;
use crate::store::{Collection, RetrievedChunk};

/// Extract a ticket document to plain text. Unsupported or empty tickets
/// are an error here: there is nothing to query with.
pub fn extract_ticket(path: &Path) -> Result<String> {
    let doc = extract(path)
        .with_context(|| format!("failed to extract ticket {}", path.display()))?;
    match doc {
        Some(d) if !d.content.is_empty() => Ok(d.content.to_text()),
        _ => bail!("could not extract any text from ticket {}", path.display()),
    }
}

/// Top-`k` chunks for a ticket, in the store's rank order.
pub async fn retrieve_context(
    collection: &dyn Collection,
    ticket_text: &str,
    k: usize,
) -> Result<Vec<RetrievedChunk>> {
    collection.query(ticket_text, k).await
}

/// `triage ask`: extract the ticket, show the retrieved context, and print
/// the generated course of action.
pub async fn run_ask(
    config: &Config,
    collection: &dyn Collection,
    ticket: &Path,
    k: Option<usize>,
    no_llm: bool,
) -> Result<()> {
    let ticket_text = extract_ticket(ticket)?;

    let preview: String = ticket_text.chars().take(500).collect();
    println!("--- Ticket content ---");
    if ticket_text.chars().count() > 500 {
        println!("{}...", preview);
    } else {
        println!("{}", preview);
    }
    println!();

    let k = k.unwrap_or(config.retrieval.n_results);
    let results = retrieve_context(collection, &ticket_text, k).await?;

    print_matches(&results);

    if no_llm {
        return Ok(());
    }

    let answer = llm::generate_action(&config.llm, &ticket_text, &results).await;
    println!();
    println!("--- Suggested course of action ---");
    println!();
    println!("{}", answer);
    Ok(())
}

/// `triage search`: retrieval only, for inspecting what the index returns.
pub async fn run_search(
    config: &Config,
    collection: &dyn Collection,
    query: &str,
    k: Option<usize>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }
    let k = k.unwrap_or(config.retrieval.n_results);
    let results = collection.query(query, k).await?;
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    print_matches(&results);
    Ok(())
}

fn print_matches(results: &[RetrievedChunk]) {
    if results.is_empty() {
        println!("No matches in the knowledge base.");
        return;
    }
    println!("Top matches:");
    for r in results {
        println!("- {}  ({})", r.id, r.doc_type());
        println!("  {}", snippet(&r.text, 200));
    }
}

/// Single-line excerpt for display.
fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let cut: String = flat.chars().take(max_chars).collect();
    if flat.chars().count() > max_chars {
        format!("{}…", cut)
    } else {
        cut
    }
}
