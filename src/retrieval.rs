//! Query facade over the shared index.
//!
//! `top_k` and `min_similarity` are fixed at construction, so identical
//! queries return identical result sets for a given index snapshot.

use std::sync::Arc;

use anyhow::Result;

use crate::models::SearchResult;
use crate::store::SharedIndex;

/// Outcome of a retrieval query. `NotIndexed` means no document has been
/// indexed yet — callers should tell the user to index first, which is a
/// different message than an empty `Hits` ("nothing relevant").
#[derive(Debug)]
pub enum SearchResponse {
    NotIndexed,
    Hits(Vec<SearchResult>),
}

pub struct RetrievalService {
    index: Arc<SharedIndex>,
    top_k: usize,
    min_similarity: f64,
}

impl RetrievalService {
    pub fn new(index: Arc<SharedIndex>, top_k: usize, min_similarity: f64) -> Self {
        Self {
            index,
            top_k,
            min_similarity,
        }
    }

    /// Vectorize the query with the snapshot's own vectorizer and search
    /// that same snapshot, so query and corpus statistics always agree.
    pub fn search(&self, query: &str) -> Result<SearchResponse> {
        let snapshot = self.index.snapshot();
        if snapshot.store.is_empty() {
            return Ok(SearchResponse::NotIndexed);
        }

        let query_vector = snapshot.vectorizer.vectorize(query)?;
        let hits = snapshot
            .store
            .search(&query_vector, self.top_k, self.min_similarity);
        Ok(SearchResponse::Hits(hits))
    }

    pub fn index_size(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexingConfig;
    use crate::indexer::{DocumentIndexer, NoProgress};
    use std::fs;
    use tempfile::TempDir;

    fn indexed_service(files: &[(&str, &str)]) -> (TempDir, RetrievalService) {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }

        let index = Arc::new(SharedIndex::new());
        DocumentIndexer::new(IndexingConfig::default())
            .index_directory(tmp.path(), &index, &NoProgress)
            .unwrap();
        (tmp, RetrievalService::new(index, 10, 0.01))
    }

    #[test]
    fn search_before_indexing_reports_not_indexed() {
        let service = RetrievalService::new(Arc::new(SharedIndex::new()), 10, 0.01);
        assert_eq!(service.index_size(), 0);
        match service.search("anything").unwrap() {
            SearchResponse::NotIndexed => {}
            SearchResponse::Hits(_) => panic!("empty index must report NotIndexed"),
        }
    }

    #[test]
    fn search_finds_relevant_document() {
        let (_tmp, service) = indexed_service(&[
            ("auth.md", "authentication middleware token validation flow"),
            ("deploy.md", "deployment pipeline container registry"),
        ]);
        assert_eq!(service.index_size(), 2);

        let SearchResponse::Hits(hits) = service.search("token authentication").unwrap() else {
            panic!("index is populated");
        };
        assert!(!hits.is_empty());
        assert!(hits[0].document.source_path.ends_with("auth.md"));
    }

    #[test]
    fn no_matches_is_empty_hits_not_not_indexed() {
        let (_tmp, service) =
            indexed_service(&[("auth.md", "authentication middleware token")]);

        let SearchResponse::Hits(hits) = service.search("пустой запрос").unwrap() else {
            panic!("index is populated");
        };
        assert!(hits.is_empty());
    }
}
