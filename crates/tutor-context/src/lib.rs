//! # Tutor Context
//!
//! **Source-prioritized context retrieval for an AI tutor.**
//!
//! Given a student's question, Tutor Context embeds the query, fans out
//! scoped vector searches (the user's own materials, a pinned book, the
//! shared knowledge base), merges and re-ranks the candidates with
//! trust-weighted scoring, deduplicates near-identical passages, and
//! returns a bounded context bundle with per-source citations for the
//! response generator to ground its answer on.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐    ┌─────────────────────────┐    ┌───────────┐
//! │ Embedder │───▶│  Retriever               │◀──│  Vector    │
//! │ (HTTP)   │    │  fan-out → rank → cite   │    │  store     │
//! └──────────┘    └───────────┬─────────────┘    └───────────┘
//!                             │
//!              ┌──────────────┤
//!              ▼              ▼
//!         ┌──────────┐  ┌──────────┐
//!         │   CLI    │  │   HTTP   │
//!         │(tutorctx)│  │ (axum)   │
//!         └──────────┘  └──────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **embedding gateway** ([`embedding`]) turns the question into a
//!    query vector.
//! 2. The **orchestrator** ([`retrieve`]) issues up to three concurrent
//!    scoped searches against the **vector-store gateway**
//!    ([`vector_store`]), each with a bounded timeout and independent
//!    failure isolation.
//! 3. The merged candidates flow through the **source prioritizer** and
//!    **citation builder** (`tutor-context-core`).
//! 4. The resulting bundle is exposed via the **CLI** (`tutorctx`) and the
//!    **HTTP tool server** ([`server`]).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`embedding`] | Embedding gateway: OpenAI-compatible provider with retry/backoff |
//! | [`vector_store`] | Vector-store gateway: Qdrant-style REST search |
//! | [`retrieve`] | Retrieval orchestrator: embed → fan-out → rank → cite |
//! | [`server`] | HTTP tool server (Axum) with CORS |
//!
//! ## Configuration
//!
//! Tutor Context is configured via a TOML file (default:
//! `config/tutor.toml`). See [`config`] for all options and
//! [`config::load_config`] for validation rules.

pub mod config;
pub mod embedding;
pub mod retrieve;
pub mod server;
pub mod vector_store;

pub use retrieve::{Retriever, RetrieverOptions, RetrieveRequest};
pub use tutor_context_core::models::{ContextBundle, SourceType};
pub use tutor_context_core::{citation, gateway, memory, models, rank};
