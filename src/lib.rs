//! # Triage Harness
//!
//! A local-first knowledge-base harness for retrieval-augmented support
//! ticket triage.
//!
//! Triage Harness walks a heterogeneous directory tree of documents (PDFs,
//! captions, plain text, code, videos with sidecar transcripts), splits the
//! extracted text into overlapping chunks with deterministic IDs, and
//! indexes only the chunks not already present in the store. A ticket
//! document is then answered by nearest-neighbor retrieval over the index
//! plus an LLM call.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────────┐   ┌───────────┐
//! │ Directory  │──▶│   Pipeline    │──▶│  SQLite   │
//! │   walk     │   │ Extract+Chunk │   │ + vectors │
//! └────────────┘   └───────────────┘   └─────┬─────┘
//!                                            │
//!                              ┌─────────────┤
//!                              ▼             ▼
//!                        ┌──────────┐  ┌──────────┐
//!                        │ (triage) │  │  Gemini  │
//!                        │   CLI    │  │  answer  │
//!                        └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! triage init                   # create the store
//! triage ingest                 # index the knowledge base
//! triage ask ticket.pdf         # retrieve context and generate an answer
//! triage search "vpn timeout"   # inspect retrieval without the LLM
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and chunk IDs |
//! | [`extract`] | Format-aware extraction |
//! | [`caption`] | WebVTT/SRT parsing with fallback |
//! | [`chunk`] | Sliding-window chunking |
//! | [`scan`] | Directory walk and sidecar resolution |
//! | [`ingest`] | Dedup + batched indexing |
//! | [`retrieve`] | Ticket retrieval assembly |
//! | [`llm`] | Gemini answer generation |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Collection trait, SQLite and memory backends |

pub mod caption;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod retrieve;
pub mod scan;
pub mod store;
