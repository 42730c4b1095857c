//! End-to-end tests over the library: index a real directory tree, search
//! it, then run the full link → score → cache pipeline with constructed
//! issues and commits. No network involved.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use repo_triage::cache::IssueCache;
use repo_triage::config::{IndexingConfig, ScoringConfig};
use repo_triage::indexer::{DocumentIndexer, NoProgress};
use repo_triage::linker::link_commits;
use repo_triage::models::{Commit, CommitAuthor, CommitDetails, Issue};
use repo_triage::retrieval::{RetrievalService, SearchResponse};
use repo_triage::scoring::PriorityCalculator;
use repo_triage::store::SharedIndex;
use repo_triage::triage::sort_by_priority;

fn write_tree(dir: &TempDir) {
    let root = dir.path();
    std::fs::write(
        root.join("payments.md"),
        "The payment gateway retries failed charges with exponential backoff. \
         Gateway timeouts surface as retry exhaustion errors.",
    )
    .unwrap();
    std::fs::write(
        root.join("auth.md"),
        "Authentication uses short lived session tokens. Tokens rotate on \
         every privileged request.",
    )
    .unwrap();
    std::fs::write(
        root.join("notes.txt"),
        "Weekly planning notes. Nothing about subsystems here.",
    )
    .unwrap();
}

fn issue(number: u64, title: &str, body: &str, age_days: i64) -> Issue {
    let stamp = (Utc::now() - Duration::days(age_days)).to_rfc3339();
    Issue {
        number,
        title: title.to_string(),
        body: Some(body.to_string()),
        state: "open".to_string(),
        created_at: stamp.clone(),
        updated_at: stamp,
        labels: Vec::new(),
        user: None,
    }
}

fn commit(sha: &str, message: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        details: CommitDetails {
            message: message.to_string(),
            author: CommitAuthor {
                name: "alice".to_string(),
                email: None,
                date: Utc::now().to_rfc3339(),
            },
        },
        author: None,
    }
}

fn indexed(dir: &TempDir) -> Arc<SharedIndex> {
    let config = IndexingConfig {
        root: dir.path().to_path_buf(),
        ..IndexingConfig::default()
    };
    let index = Arc::new(SharedIndex::new());
    DocumentIndexer::new(config)
        .index_directory(dir.path(), &index, &NoProgress)
        .unwrap();
    index
}

#[test]
fn index_then_search_finds_the_relevant_file() {
    let dir = TempDir::new().unwrap();
    write_tree(&dir);
    let index = indexed(&dir);

    let retrieval = RetrievalService::new(index, 5, 0.01);
    let SearchResponse::Hits(hits) = retrieval.search("payment gateway retry").unwrap() else {
        panic!("index must not be empty");
    };

    assert!(!hits.is_empty());
    assert!(hits[0].document.source_path.ends_with("payments.md"));
}

#[test]
fn search_before_indexing_reports_not_indexed() {
    let index = Arc::new(SharedIndex::new());
    let retrieval = RetrievalService::new(index, 5, 0.01);
    assert!(matches!(
        retrieval.search("anything").unwrap(),
        SearchResponse::NotIndexed
    ));
}

#[test]
fn link_score_sort_pipeline() {
    let dir = TempDir::new().unwrap();
    write_tree(&dir);
    let index = indexed(&dir);

    let issues = vec![
        issue(
            1,
            "Payment gateway retry storm",
            "Charges retried far past the backoff ceiling",
            1,
        ),
        issue(2, "Dark mode toggle", "Cosmetic request", 200),
    ];
    let commits = vec![
        commit("a1", "fixes #1 cap the retry budget"),
        commit("a2", "refs #1 add gateway timeout metric"),
        commit("a3", "unrelated refactor"),
    ];

    let linked = link_commits(&issues, &commits);
    assert_eq!(linked[0].commits.len(), 2);
    assert_eq!(linked[1].commits.len(), 0);

    let retrieval = Arc::new(RetrievalService::new(index, 5, 0.01));
    let calculator = PriorityCalculator::new(retrieval, &ScoringConfig::default()).unwrap();

    let mut scored = calculator.calculate_scores(&linked);
    sort_by_priority(&mut scored);

    // Active, recent, relevant issue outranks the stale cosmetic one.
    assert_eq!(scored[0].issue.number, 1);
    assert!(scored[0].priority_score > scored[1].priority_score);
    assert_eq!(scored[0].commit_count, 2);
    assert!(scored[0].rag_score > 0.0);
    assert!(scored[1].recency_score < 0.01);
}

#[test]
fn scored_results_survive_a_cache_round_trip() {
    let dir = TempDir::new().unwrap();
    write_tree(&dir);
    let index = indexed(&dir);

    let issues = vec![issue(7, "Token rotation breaks sessions", "", 3)];
    let commits = vec![commit("b1", "closes #7 rotate in place")];
    let linked = link_commits(&issues, &commits);

    let retrieval = Arc::new(RetrievalService::new(index, 5, 0.01));
    let calculator = PriorityCalculator::new(retrieval, &ScoringConfig::default()).unwrap();
    let scored = calculator.calculate_scores(&linked);

    let cache_dir = TempDir::new().unwrap();
    let cache = IssueCache::new(cache_dir.path().join("cache.json"), 60);
    cache.save(&scored).unwrap();

    let restored = cache.from_cache(cache.load().expect("fresh cache must hit"));
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].issue.number, 7);
    assert!((restored[0].priority_score - scored[0].priority_score).abs() < 1e-12);
    assert!((restored[0].commit_score - scored[0].commit_score).abs() < 1e-12);
    assert!((restored[0].recency_score - scored[0].recency_score).abs() < 1e-12);
    assert!((restored[0].rag_score - scored[0].rag_score).abs() < 1e-12);
}
