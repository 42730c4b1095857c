//! Issue priority calculation: three bounded `[0, 1]` component scorers
//! blended by configured weights.
//!
//! Every component degrades to 0.0 on its own failure (bad timestamp,
//! retrieval error) instead of failing the whole calculation. Weights are
//! explicit constructor state — never ambient globals — and must sum to
//! 1.0; a bad sum is rejected before any scoring starts.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ScoringConfig, Weights};
use crate::models::{Commit, Issue, LinkedIssue, ScoredIssue};
use crate::retrieval::{RetrievalService, SearchResponse};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Commit-activity score: linked commit count normalized against
/// `max_commits`, clamped at 1.0.
pub fn commit_activity_score(commit_count: usize, max_commits: usize) -> f64 {
    (commit_count as f64 / max_commits as f64).min(1.0)
}

/// Exponential decay on days since last update: `exp(-days / decay_days)`.
///
/// 0 days -> 1.0, 30 days -> ~0.37, 60 days -> ~0.14 at the default
/// half-life of 30.
pub struct RecencyScorer {
    decay_days: f64,
}

impl RecencyScorer {
    pub fn new(decay_days: f64) -> Self {
        Self { decay_days }
    }

    pub fn score(&self, issue: &Issue) -> f64 {
        self.score_at(issue, Utc::now())
    }

    /// Unparseable timestamps score 0.0 (maximally stale); timestamps in
    /// the future clamp to 1.0.
    pub fn score_at(&self, issue: &Issue, now: DateTime<Utc>) -> f64 {
        self.decay(&issue.updated_at, now)
    }

    /// Same decay applied to the issue's age (`created_at`).
    pub fn score_by_age(&self, issue: &Issue, now: DateTime<Utc>) -> f64 {
        self.decay(&issue.created_at, now)
    }

    fn decay(&self, timestamp: &str, now: DateTime<Utc>) -> f64 {
        let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
            debug!(timestamp, "unparseable timestamp, recency scores 0.0");
            return 0.0;
        };
        let days = ((now - parsed.with_timezone(&Utc)).num_seconds() as f64 / SECONDS_PER_DAY)
            .max(0.0);
        (-days / self.decay_days).exp()
    }
}

/// Relevance of an issue to the indexed corpus: the maximum similarity
/// among the top retrieval hits for `title + "\n" + body`.
pub struct RagRelevanceScorer {
    retrieval: Arc<RetrievalService>,
}

impl RagRelevanceScorer {
    pub fn new(retrieval: Arc<RetrievalService>) -> Self {
        Self { retrieval }
    }

    pub fn score(&self, issue: &Issue) -> f64 {
        self.score_with(issue, |hits| {
            hits.iter().map(|hit| hit.score).fold(0.0, f64::max)
        })
    }

    /// Mean similarity instead of the maximum. Not used by the default
    /// blend; kept for experimentation via the library API.
    pub fn score_average(&self, issue: &Issue) -> f64 {
        self.score_with(issue, |hits| {
            if hits.is_empty() {
                0.0
            } else {
                hits.iter().map(|hit| hit.score).sum::<f64>() / hits.len() as f64
            }
        })
    }

    fn score_with(
        &self,
        issue: &Issue,
        aggregate: impl Fn(&[crate::models::SearchResult]) -> f64,
    ) -> f64 {
        let query = build_query(issue);
        match self.retrieval.search(&query) {
            Ok(SearchResponse::Hits(hits)) if !hits.is_empty() => {
                let score = aggregate(&hits);
                debug!(issue = issue.number, score, "relevance score");
                score
            }
            Ok(SearchResponse::Hits(_)) => 0.0,
            Ok(SearchResponse::NotIndexed) => {
                debug!(issue = issue.number, "no index, relevance scores 0.0");
                0.0
            }
            Err(e) => {
                warn!(issue = issue.number, error = %e, "relevance lookup failed");
                0.0
            }
        }
    }
}

fn build_query(issue: &Issue) -> String {
    match issue.body.as_deref() {
        Some(body) if !body.trim().is_empty() => format!("{}\n{}", issue.title, body),
        _ => issue.title.clone(),
    }
}

/// Blend the three component scores with the configured weights.
pub fn weighted_total(weights: &Weights, commit: f64, recency: f64, rag: f64) -> f64 {
    commit * weights.commit_activity + recency * weights.recency + rag * weights.rag_relevance
}

/// Combines commit activity, recency, and retrieval relevance into one
/// priority per issue.
pub struct PriorityCalculator {
    recency: RecencyScorer,
    rag: RagRelevanceScorer,
    weights: Weights,
    max_commits: usize,
}

impl PriorityCalculator {
    /// Rejects weight configurations that do not sum to 1.0.
    pub fn new(retrieval: Arc<RetrievalService>, config: &ScoringConfig) -> Result<Self> {
        config.weights.validate()?;
        Ok(Self {
            recency: RecencyScorer::new(config.decay_days),
            rag: RagRelevanceScorer::new(retrieval),
            weights: config.weights,
            max_commits: config.max_commits_for_normalization,
        })
    }

    pub fn calculate_score(&self, issue: &Issue, linked_commits: &[Commit]) -> ScoredIssue {
        let commit_score = commit_activity_score(linked_commits.len(), self.max_commits);
        let recency_score = self.recency.score(issue);
        let rag_score = self.rag.score(issue);

        ScoredIssue {
            issue: issue.clone(),
            priority_score: weighted_total(&self.weights, commit_score, recency_score, rag_score),
            commit_count: linked_commits.len(),
            commit_score,
            recency_score,
            rag_score,
            linked_commits: linked_commits.to_vec(),
        }
    }

    /// Score a batch. The per-issue calculations are independent, so they
    /// run on the rayon pool; the returned order carries no meaning —
    /// callers sort by `priority_score` themselves.
    pub fn calculate_scores(&self, linked: &[LinkedIssue]) -> Vec<ScoredIssue> {
        info!(issues = linked.len(), "calculating priority scores");

        let results: Vec<ScoredIssue> = linked
            .par_iter()
            .map(|entry| self.calculate_score(&entry.issue, &entry.commits))
            .collect();

        if !results.is_empty() {
            let min = results
                .iter()
                .map(|r| r.priority_score)
                .fold(f64::INFINITY, f64::min);
            let max = results
                .iter()
                .map(|r| r.priority_score)
                .fold(f64::NEG_INFINITY, f64::max);
            info!(min, max, "priority scores computed");
        }

        results
    }
}
