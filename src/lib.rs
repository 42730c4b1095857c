//! # Repo Triage
//!
//! A retrieval and prioritization engine for GitHub repositories.
//!
//! Repo Triage indexes a project's files into an in-memory vector index
//! (TF-IDF by default, optionally a local ONNX embedding model), retrieves
//! the files most relevant to an issue, links recent commits to the issues
//! they reference, and blends commit activity, recency, and retrieval
//! relevance into a single priority score per issue. Scored results are
//! kept in a TTL-bounded JSON file cache between runs.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────────┐   ┌─────────────┐
//! │  Indexer  │──▶│ SharedIndex │◀──│  Retrieval  │
//! │  walkdir  │   │  snapshot   │   │   top-k     │
//! └───────────┘   └─────────────┘   └──────┬──────┘
//!                                          │
//! ┌───────────┐   ┌─────────────┐   ┌──────▼──────┐   ┌─────────┐
//! │  GitHub   │──▶│   Linker    │──▶│   Scoring   │──▶│  Cache  │
//! │ issues+SHA│   │ fixes #N    │   │  weighted   │   │  TTL    │
//! └───────────┘   └─────────────┘   └─────────────┘   └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! triage init                   # write an example config
//! triage index                  # index the working tree
//! triage search "payment retry" # retrieve relevant files
//! triage rank                   # fetch, link, score, and rank issues
//! triage cache info             # inspect the result cache
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`vectorizer`] | Tokenization, TF-IDF, cosine similarity |
//! | [`store`] | In-memory vector store and atomic index snapshots |
//! | [`indexer`] | Directory walking and index builds |
//! | [`retrieval`] | Top-k similarity search over the index |
//! | [`github`] | GitHub REST client |
//! | [`linker`] | Commit-message issue reference linking |
//! | [`scoring`] | Component scorers and the weighted calculator |
//! | [`cache`] | TTL-bounded JSON result cache |
//! | [`triage`] | End-to-end fetch, link, score, cache flow |

pub mod cache;
pub mod config;
#[cfg(feature = "local-embeddings")]
pub mod dense;
pub mod github;
pub mod indexer;
pub mod linker;
pub mod models;
pub mod retrieval;
pub mod scoring;
pub mod store;
pub mod triage;
pub mod vectorizer;
