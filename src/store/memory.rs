//! In-memory [`Collection`] implementation for tests.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. Query is
//! brute-force cosine similarity over all stored vectors.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::{cosine_similarity, Embedder};
use crate::models::ChunkRecord;

use super::{Collection, RetrievedChunk};

struct StoredRecord {
    text: String,
    metadata: serde_json::Value,
    vector: Option<Vec<f32>>,
}

/// In-memory collection. Without an embedder, records are stored vectorless
/// and queries fail with a descriptive error.
pub struct MemoryCollection {
    records: RwLock<HashMap<String, StoredRecord>>,
    embedder: Option<Box<dyn Embedder>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            embedder: None,
        }
    }

    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            embedder: Some(embedder),
        }
    }

    /// Snapshot of all stored records, for test assertions.
    pub fn snapshot(&self) -> Vec<RetrievedChunk> {
        let records = self.records.read().unwrap();
        let mut all: Vec<RetrievedChunk> = records
            .iter()
            .map(|(id, rec)| RetrievedChunk {
                id: id.clone(),
                text: rec.text.clone(),
                metadata: rec.metadata.clone(),
                score: 0.0,
            })
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn ids(&self) -> Result<HashSet<String>> {
        Ok(self.records.read().unwrap().keys().cloned().collect())
    }

    async fn add(&self, records: &[ChunkRecord]) -> Result<()> {
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let vectors = match &self.embedder {
            Some(embedder) => match embedder.embed(&texts).await {
                Ok(vecs) => Some(vecs),
                Err(e) => {
                    eprintln!("Warning: embedding failed, storing without vectors: {:#}", e);
                    None
                }
            },
            None => None,
        };

        let mut stored = self.records.write().unwrap();
        for (i, record) in records.iter().enumerate() {
            stored.insert(
                record.id.clone(),
                StoredRecord {
                    text: record.text.clone(),
                    metadata: record.meta.to_json(),
                    vector: vectors.as_ref().and_then(|v| v.get(i).cloned()),
                },
            );
        }
        Ok(())
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<RetrievedChunk>> {
        let embedder = match &self.embedder {
            Some(e) => e,
            None => bail!("Embedding provider is disabled; cannot query the collection"),
        };
        let query_vec = embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

        let records = self.records.read().unwrap();
        let mut scored: Vec<RetrievedChunk> = records
            .iter()
            .filter_map(|(id, rec)| {
                rec.vector.as_ref().map(|v| RetrievedChunk {
                    id: id.clone(),
                    text: rec.text.clone(),
                    metadata: rec.metadata.clone(),
                    score: cosine_similarity(&query_vec, v),
                })
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(n_results);
        Ok(scored)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().unwrap().len() as u64)
    }
}
