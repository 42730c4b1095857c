//! Core data types that flow through the indexing and scoring pipeline.
//!
//! [`Document`] and [`SearchResult`] belong to the retrieval side;
//! [`Issue`], [`Commit`], and [`ScoredIssue`] to the prioritization side.
//! The GitHub DTOs mirror the REST API wire shape and keep timestamps as
//! strings so a malformed date degrades a single score instead of failing
//! the whole fetch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An indexed file. Immutable once created; identity is `source_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub source_path: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_path: source_path.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// A single hit from a similarity search. Ephemeral, constructed per query.
///
/// `score` is cosine similarity in `[-1, 1]`; for the non-negative vectors
/// produced here it lands in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: Document,
    pub score: f64,
}

/// GitHub issue as returned by `GET /repos/{owner}/{repo}/issues`.
///
/// Snapshot per fetch; identity is `number` within one owner/repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// GitHub commit as returned by `GET /repos/{owner}/{repo}/commits`.
/// Used only for reference-pattern extraction, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(rename = "commit")]
    pub details: CommitDetails,
    #[serde(default)]
    pub author: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetails {
    pub message: String,
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub date: String,
}

/// An issue paired with the commits the linker attributed to it.
#[derive(Debug, Clone)]
pub struct LinkedIssue {
    pub issue: Issue,
    pub commits: Vec<Commit>,
}

/// An issue with its computed priority and the three component scores.
///
/// Recomputed on every scoring pass. All four scores are in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ScoredIssue {
    pub issue: Issue,
    pub priority_score: f64,
    pub commit_count: usize,
    pub commit_score: f64,
    pub recency_score: f64,
    pub rag_score: f64,
    pub linked_commits: Vec<Commit>,
}

/// Flattened scored-issue record as persisted in the cache file.
///
/// All three component scores are stored so reconstructing a
/// [`ScoredIssue`] from cache is lossless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub priority_score: f64,
    pub commit_count: usize,
    pub commit_score: f64,
    pub recency_score: f64,
    pub rag_relevance: f64,
}

impl CachedIssue {
    pub fn from_scored(scored: &ScoredIssue) -> Self {
        Self {
            number: scored.issue.number,
            title: scored.issue.title.clone(),
            state: scored.issue.state.clone(),
            created_at: scored.issue.created_at.clone(),
            updated_at: scored.issue.updated_at.clone(),
            priority_score: scored.priority_score,
            commit_count: scored.commit_count,
            commit_score: scored.commit_score,
            recency_score: scored.recency_score,
            rag_relevance: scored.rag_score,
        }
    }

    pub fn into_scored(self) -> ScoredIssue {
        ScoredIssue {
            issue: Issue {
                number: self.number,
                title: self.title,
                body: None,
                state: self.state,
                created_at: self.created_at,
                updated_at: self.updated_at,
                labels: Vec::new(),
                user: None,
            },
            priority_score: self.priority_score,
            commit_count: self.commit_count,
            commit_score: self.commit_score,
            recency_score: self.recency_score,
            rag_score: self.rag_relevance,
            linked_commits: Vec::new(),
        }
    }
}

/// On-disk cache payload: the scored issues plus the stamp the TTL check
/// runs against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedIssuesData {
    pub issues: Vec<CachedIssue>,
    pub last_updated: String,
}

/// Summary returned by the indexer after a full run.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub total_files: usize,
    pub counts_by_type: BTreeMap<String, usize>,
    pub total_tokens: usize,
}
