//! SQLite-backed [`Collection`].
//!
//! One database file holds any number of named collections. Records are
//! keyed by `(collection, chunk id)` and carry the chunk text, metadata
//! JSON, an ingest timestamp, and an optional embedding BLOB (little-endian
//! f32). Schema creation is idempotent, so opening doubles as
//! get-or-create.

use std::collections::HashSet;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::config::StoreConfig;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, Embedder};
use crate::models::ChunkRecord;

use super::{Collection, RetrievedChunk};

pub struct SqliteCollection {
    pool: SqlitePool,
    name: String,
    embedder: Box<dyn Embedder>,
}

impl SqliteCollection {
    /// Open (or create) the store at the configured path and ensure the
    /// named collection exists.
    pub async fn open(config: &StoreConfig, embedder: Box<dyn Embedder>) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        create_schema(&pool).await?;

        sqlx::query("INSERT OR IGNORE INTO collections (name, created_at) VALUES (?, ?)")
            .bind(&config.collection)
            .bind(chrono::Utc::now().timestamp())
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            name: config.collection.clone(),
            embedder,
        })
    }

    /// Record counts grouped by document type, for `triage stats`.
    pub async fn type_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(json_extract(metadata_json, '$.type'), 'unknown') AS doc_type,
                   COUNT(*) AS n
            FROM records
            WHERE collection = ?
            GROUP BY doc_type
            ORDER BY n DESC
            "#,
        )
        .bind(&self.name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("doc_type"), row.get::<i64, _>("n")))
            .collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            document TEXT NOT NULL,
            metadata_json TEXT NOT NULL DEFAULT '{}',
            embedding BLOB,
            model TEXT,
            ingested_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection)")
        .execute(pool)
        .await?;

    Ok(())
}

#[async_trait]
impl Collection for SqliteCollection {
    async fn ids(&self) -> Result<HashSet<String>> {
        let rows: Vec<String> = sqlx::query_scalar("SELECT id FROM records WHERE collection = ?")
            .bind(&self.name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn add(&self, records: &[ChunkRecord]) -> Result<()> {
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        // Embedding is inline and non-fatal: records land without vectors
        // when the provider is disabled or unreachable.
        let vectors = match self.embedder.embed(&texts).await {
            Ok(vecs) => Some(vecs),
            Err(e) => {
                eprintln!("Warning: embedding failed, storing without vectors: {:#}", e);
                None
            }
        };

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for (i, record) in records.iter().enumerate() {
            let blob = vectors
                .as_ref()
                .and_then(|v| v.get(i))
                .map(|v| vec_to_blob(v));
            let model = blob.as_ref().map(|_| self.embedder.model_name().to_string());

            sqlx::query(
                r#"
                INSERT INTO records (collection, id, document, metadata_json, embedding, model, ingested_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&self.name)
            .bind(&record.id)
            .bind(&record.text)
            .bind(record.meta.to_json().to_string())
            .bind(blob)
            .bind(model)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<RetrievedChunk>> {
        let query_vec = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

        let rows = sqlx::query(
            r#"
            SELECT id, document, metadata_json, embedding
            FROM records
            WHERE collection = ? AND embedding IS NOT NULL
            "#,
        )
        .bind(&self.name)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<RetrievedChunk> = rows
            .into_iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                let metadata: serde_json::Value =
                    serde_json::from_str(&row.get::<String, _>("metadata_json"))
                        .unwrap_or_else(|_| serde_json::json!({}));
                RetrievedChunk {
                    id: row.get("id"),
                    text: row.get("document"),
                    metadata,
                    score: cosine_similarity(&query_vec, &vector),
                }
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
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}
