//! Storage abstraction for indexed chunks.
//!
//! The [`Collection`] trait mirrors the external vector-store surface the
//! pipeline depends on: one bulk ID read, batched adds that compute
//! embeddings internally, nearest-neighbor queries, and a record count.
//! Backends are pluggable; the embedding provider is passed in at
//! construction, never looked up from global state.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ChunkRecord;

pub use memory::MemoryCollection;
pub use sqlite::SqliteCollection;

/// A ranked chunk returned from a nearest-neighbor query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Deterministic chunk key.
    pub id: String,
    /// Indexed chunk text.
    pub text: String,
    /// Document metadata as stored (`source`, `name`, `parent`, `type`).
    pub metadata: serde_json::Value,
    /// Raw similarity score from the backend.
    pub score: f32,
}

impl RetrievedChunk {
    /// Document-type tag from the stored metadata.
    pub fn doc_type(&self) -> &str {
        self.metadata
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("unknown")
    }
}

/// Keyed, query-able repository of indexed chunks.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ids`](Collection::ids) | All stored chunk IDs, one bulk read |
/// | [`add`](Collection::add) | Index a batch of records (embeds internally) |
/// | [`query`](Collection::query) | Top-k nearest chunks for a query text |
/// | [`count`](Collection::count) | Total stored records |
#[async_trait]
pub trait Collection: Send + Sync {
    /// The full set of stored chunk IDs. This is the dedup source: the
    /// coordinator reads it once per run, never per item.
    async fn ids(&self) -> Result<HashSet<String>>;

    /// Index a batch of records. Embeddings are computed inside the store;
    /// existing records are never overwritten by this call.
    async fn add(&self, records: &[ChunkRecord]) -> Result<()>;

    /// Top-`n_results` chunks nearest to `text`, in rank order. An empty
    /// result is an explicit empty set, not an error.
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<RetrievedChunk>>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64>;
}
