//! In-memory vector store and the atomically swappable index snapshot.
//!
//! The corpus is bounded by one project's file count, so search is a
//! brute-force cosine scan — no ANN structure. Reindexing never mutates a
//! live store: the indexer builds a complete [`IndexSnapshot`] off to the
//! side and [`SharedIndex::install`]s it in a single reference swap, so
//! concurrent readers see either the fully-old or the fully-new index.

use std::sync::{Arc, RwLock};

use crate::models::{Document, IndexStats, SearchResult};
use crate::vectorizer::{cosine_similarity, TfIdfVectorizer, Vector, Vectorizer};

struct Entry {
    document: Document,
    vector: Vector,
}

/// Holds (document, vector) pairs and answers similarity queries.
#[derive(Default)]
pub struct VectorStore {
    entries: Vec<Entry>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, document: Document, vector: Vector) {
        self.entries.push(Entry { document, vector });
    }

    /// Score every stored vector against the query, keep those at or above
    /// `min_similarity`, sort descending, truncate to `top_k`.
    ///
    /// The sort is stable, so equal scores come back in insertion order.
    /// An empty store returns an empty list, never an error.
    pub fn search(
        &self,
        query_vector: &Vector,
        top_k: usize,
        min_similarity: f64,
    ) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                document: entry.document.clone(),
                score: cosine_similarity(query_vector, &entry.vector),
            })
            .filter(|result| result.score >= min_similarity)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        results
    }

    /// Drop all documents and vectors, releasing embeddings that may be
    /// dimensioned for a different vectorizer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully built index: the vectorizer (with whatever corpus statistics it
/// accumulated), the populated store, and the stats from the build.
/// Immutable after construction.
pub struct IndexSnapshot {
    pub vectorizer: Box<dyn Vectorizer>,
    pub store: VectorStore,
    pub stats: IndexStats,
}

impl IndexSnapshot {
    /// An empty snapshot, used before the first index run. Queries against
    /// it find nothing; `store.len() == 0` is the "not yet indexed" signal.
    pub fn empty() -> Self {
        Self {
            vectorizer: Box::new(TfIdfVectorizer::new()),
            store: VectorStore::new(),
            stats: IndexStats::default(),
        }
    }
}

/// Shared handle to the current index snapshot.
///
/// Readers clone the `Arc` and keep using their snapshot even while a
/// refresh swaps in a new one; the old snapshot is freed when the last
/// reader drops it.
pub struct SharedIndex {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty())),
        }
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Swap in a freshly built snapshot. Readers either see the previous
    /// snapshot or this one, never an intermediate state.
    pub fn install(&self, snapshot: IndexSnapshot) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshot().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SharedIndex {
    fn default() -> Self {
        Self::new()
    }
}
