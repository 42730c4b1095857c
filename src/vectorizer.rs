//! Text-to-vector conversion.
//!
//! Two interchangeable strategies implement the [`Vectorizer`] trait:
//! the sparse TF-IDF vectorizer here and the dense ONNX-backed one in
//! [`crate::dense`] (feature `local-embeddings`). The strategy is picked
//! once at startup from `indexing.vectorizer`.
//!
//! The sparse variant depends on corpus-wide document frequencies, so
//! building an index with it is a two-pass protocol: feed every document
//! through [`TfIdfVectorizer::observe_document`] first, then vectorize.
//! Vectorizing against a partially observed corpus produces wrong IDF
//! values, which is a correctness bug, not a performance trade-off.

use std::collections::{HashMap, HashSet};

use anyhow::Result;

/// A document or query vector. Sparse vectors map token → TF-IDF weight;
/// dense vectors are fixed-length embeddings.
///
/// Dense vectors from different vectorizer instances are not comparable;
/// mixed or mismatched-dimension comparisons score 0.0 rather than erroring.
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    Sparse(HashMap<String, f64>),
    Dense(Vec<f32>),
}

impl Vector {
    pub fn dot(&self, other: &Vector) -> f64 {
        match (self, other) {
            (Vector::Sparse(a), Vector::Sparse(b)) => a
                .iter()
                .map(|(token, value)| value * b.get(token).copied().unwrap_or(0.0))
                .sum(),
            (Vector::Dense(a), Vector::Dense(b)) => {
                if a.len() != b.len() {
                    return 0.0;
                }
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| *x as f64 * *y as f64)
                    .sum()
            }
            _ => 0.0,
        }
    }

    /// L2 norm.
    pub fn norm(&self) -> f64 {
        match self {
            Vector::Sparse(a) => a.values().map(|v| v * v).sum::<f64>().sqrt(),
            Vector::Dense(a) => a.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Vector::Sparse(a) => a.is_empty(),
            Vector::Dense(a) => a.is_empty(),
        }
    }
}

/// Cosine similarity between two vectors: `dot(a,b) / (‖a‖·‖b‖)`.
///
/// Returns 0.0 when either norm is zero — never divides by zero, never
/// errors. Symmetric in its arguments.
pub fn cosine_similarity(a: &Vector, b: &Vector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    a.dot(b) / denom
}

/// A text-to-vector strategy. Implementations must be safe to share across
/// threads once the corpus is built; batch scoring reads them in parallel.
pub trait Vectorizer: Send + Sync {
    fn vectorize(&self, text: &str) -> Result<Vector>;
    /// Output dimensionality. For the sparse variant this is the observed
    /// vocabulary size, which only stabilizes after pass one.
    fn dimension(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Split text into lowercase alphanumeric tokens (Latin + Cyrillic),
/// dropping tokens of length <= 2.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || ('а'..='я').contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .map(|token| token.to_string())
        .collect()
}

/// Sparse frequency-based vectorizer.
///
/// Term frequency is normalized by the most frequent term in the document;
/// inverse document frequency uses add-one smoothing:
/// `idf(t) = log10((N+1)/(df(t)+1))`.
#[derive(Debug, Default)]
pub struct TfIdfVectorizer {
    document_frequency: HashMap<String, usize>,
    total_documents: usize,
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Term frequency normalized by the document's most frequent term.
    pub fn term_frequency(tokens: &[String]) -> HashMap<String, f64> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(1) as f64;

        counts
            .into_iter()
            .map(|(token, count)| (token.to_string(), count as f64 / max_count))
            .collect()
    }

    /// Pass one: account this document's distinct tokens in the corpus
    /// document frequencies.
    pub fn observe_document(&mut self, tokens: &[String]) {
        let mut seen: HashSet<&str> = HashSet::new();
        for token in tokens {
            if seen.insert(token.as_str()) {
                *self.document_frequency.entry(token.clone()).or_insert(0) += 1;
            }
        }
        self.total_documents += 1;
    }

    /// Smoothed inverse document frequency. Unseen terms get the maximal
    /// IDF `log10(N+1)`, or 1.0 when nothing has been observed yet.
    pub fn idf(&self, token: &str) -> f64 {
        let df = self.document_frequency.get(token).copied().unwrap_or(0);
        if df == 0 {
            return if self.total_documents > 0 {
                ((self.total_documents + 1) as f64).log10()
            } else {
                1.0
            };
        }
        ((self.total_documents + 1) as f64 / (df + 1) as f64).log10()
    }

    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    /// Drop all corpus statistics ahead of a reindex.
    pub fn clear(&mut self) {
        self.document_frequency.clear();
        self.total_documents = 0;
    }
}

impl Vectorizer for TfIdfVectorizer {
    fn vectorize(&self, text: &str) -> Result<Vector> {
        let tokens = tokenize(text);
        let weights = Self::term_frequency(&tokens)
            .into_iter()
            .map(|(token, tf)| {
                let idf = self.idf(&token);
                (token, tf * idf)
            })
            .collect();
        Ok(Vector::Sparse(weights))
    }

    fn dimension(&self) -> usize {
        self.document_frequency.len()
    }

    fn name(&self) -> &'static str {
        "tfidf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(pairs: &[(&str, f64)]) -> Vector {
        Vector::Sparse(
            pairs
                .iter()
                .map(|(token, value)| (token.to_string(), *value))
                .collect(),
        )
    }

    #[test]
    fn tokenize_drops_short_and_punctuation() {
        let tokens = tokenize("The quick, brown fox: it jumps! at #42");
        assert_eq!(tokens, vec!["the", "quick", "brown", "fox", "jumps"]);
    }

    #[test]
    fn tokenize_handles_cyrillic() {
        let tokens = tokenize("Поиск по векторному индексу");
        assert_eq!(tokens, vec!["поиск", "векторному", "индексу"]);
    }

    #[test]
    fn term_frequency_normalized_by_max() {
        let tokens: Vec<String> = ["cat", "cat", "cat", "dog"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let tf = TfIdfVectorizer::term_frequency(&tokens);
        assert!((tf["cat"] - 1.0).abs() < 1e-12);
        assert!((tf["dog"] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn idf_empty_corpus_is_one() {
        let vectorizer = TfIdfVectorizer::new();
        assert!((vectorizer.idf("anything") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn idf_unseen_term_gets_max() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.observe_document(&tokenize("alpha beta gamma"));
        vectorizer.observe_document(&tokenize("alpha delta"));
        // df=0 -> log10(N+1) = log10(3)
        assert!((vectorizer.idf("omega") - 3f64.log10()).abs() < 1e-12);
        // alpha appears in both docs: log10(3/3) = 0
        assert!(vectorizer.idf("alpha").abs() < 1e-12);
    }

    #[test]
    fn observe_counts_distinct_tokens_once() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.observe_document(&tokenize("loop loop loop"));
        assert_eq!(vectorizer.total_documents(), 1);
        // df("loop") = 1, so idf = log10(2/2) = 0
        assert!(vectorizer.idf("loop").abs() < 1e-12);
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = sparse(&[("alpha", 1.0), ("beta", 2.0)]);
        let b = sparse(&[("beta", 1.5), ("gamma", 0.5)]);
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn cosine_self_similarity_is_one() {
        let a = sparse(&[("alpha", 0.3), ("beta", 0.7)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);

        let d = Vector::Dense(vec![0.1, 0.2, 0.3]);
        assert!((cosine_similarity(&d, &d) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector_is_zero() {
        let a = sparse(&[("alpha", 1.0)]);
        let zero = Vector::Sparse(HashMap::new());
        assert_eq!(cosine_similarity(&a, &zero), 0.0);

        let d = Vector::Dense(vec![1.0, 2.0]);
        let dzero = Vector::Dense(vec![0.0, 0.0]);
        assert_eq!(cosine_similarity(&d, &dzero), 0.0);
    }

    #[test]
    fn cosine_mixed_representations_is_zero() {
        let a = sparse(&[("alpha", 1.0)]);
        let d = Vector::Dense(vec![1.0]);
        assert_eq!(cosine_similarity(&a, &d), 0.0);
    }

    #[test]
    fn cosine_dense_dimension_mismatch_is_zero() {
        let a = Vector::Dense(vec![1.0, 2.0]);
        let b = Vector::Dense(vec![1.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn vectorize_weighs_rare_terms_higher() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.observe_document(&tokenize("common rare"));
        vectorizer.observe_document(&tokenize("common"));
        vectorizer.observe_document(&tokenize("common"));

        let vector = vectorizer.vectorize("common rare").unwrap();
        let Vector::Sparse(weights) = vector else {
            panic!("expected sparse vector");
        };
        assert!(weights["rare"] > weights["common"]);
    }

    #[test]
    fn clear_resets_corpus_statistics() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.observe_document(&tokenize("alpha beta"));
        assert!(vectorizer.dimension() > 0);
        vectorizer.clear();
        assert_eq!(vectorizer.dimension(), 0);
        assert_eq!(vectorizer.total_documents(), 0);
        assert!((vectorizer.idf("alpha") - 1.0).abs() < 1e-12);
    }
}
