//! # Repo Triage CLI (`triage`)
//!
//! The `triage` binary indexes a working tree, searches it, and ranks a
//! GitHub repository's open issues by priority.
//!
//! ## Usage
//!
//! ```bash
//! triage --config ./triage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `triage init` | Write an example configuration file |
//! | `triage index` | Index the configured directory and print statistics |
//! | `triage search "<query>"` | Retrieve the files most relevant to a query |
//! | `triage rank` | Fetch, link, score, and rank open issues |
//! | `triage cache info` | Show result cache status |
//! | `triage cache clear` | Delete the result cache |
//!
//! Set `GITHUB_TOKEN` to raise the API rate limit and reach private
//! repositories. Logging is controlled by `RUST_LOG` and goes to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use repo_triage::cache::IssueCache;
use repo_triage::config::{self, Config};
use repo_triage::github::GitHubClient;
use repo_triage::indexer::{DocumentIndexer, StderrProgress};
use repo_triage::retrieval::{RetrievalService, SearchResponse};
use repo_triage::scoring::PriorityCalculator;
use repo_triage::store::SharedIndex;
use repo_triage::triage::TriageService;

const EXAMPLE_CONFIG: &str = r#"# Repo Triage configuration.

[github]
owner = ""            # e.g. "rust-lang"
repo = ""             # e.g. "cargo"
max_issues = 30
timeout_secs = 30

[indexing]
root = "."
extensions = ["md", "rs", "txt"]
exclude_globs = []
# "tfidf" (default) or "dense" (requires the local-embeddings feature).
vectorizer = "tfidf"

# [indexing.dense]
# model_path = "models/encoder.onnx"
# tokenizer_path = "models/tokenizer.json"
# max_length = 256

[retrieval]
top_k = 10
min_similarity = 0.01

[scoring]
max_commits_for_normalization = 50
decay_days = 30.0

[scoring.weights]
commit_activity = 0.6
recency = 0.3
rag_relevance = 0.1

[cache]
enabled = true
ttl_minutes = 60
file_path = ".repo-triage/cache.json"
"#;

/// Repo Triage CLI — index a working tree and rank GitHub issues by
/// commit activity, recency, and retrieval relevance.
#[derive(Parser)]
#[command(
    name = "triage",
    about = "Rank GitHub issues by commit activity, recency, and retrieval relevance",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./triage.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration file to the `--config` path.
    ///
    /// Refuses to overwrite an existing file.
    Init,

    /// Index the configured directory and print statistics.
    Index,

    /// Retrieve the indexed files most relevant to a query.
    ///
    /// Indexes the configured directory first, so results always reflect
    /// the current state of the tree.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (overrides `retrieval.top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Fetch, link, score, and rank open issues.
    Rank {
        /// Ignore the cache and recompute from the GitHub API.
        #[arg(long)]
        refresh: bool,

        /// Only print the first N issues.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Inspect or clear the scored-issue cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Cache management subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Show cache file path, size, age, and entry count.
    Info,
    /// Delete the cache file.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        if cli.config.exists() {
            bail!("refusing to overwrite {}", cli.config.display());
        }
        std::fs::write(&cli.config, EXAMPLE_CONFIG)
            .with_context(|| format!("write {}", cli.config.display()))?;
        println!("Wrote example config to {}", cli.config.display());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Index => {
            let index = SharedIndex::new();
            let stats = build_index(&cfg, &index)?;
            println!("Indexed {} files, {} tokens", stats.total_files, stats.total_tokens);
            for (file_type, count) in &stats.counts_by_type {
                println!("  {:<12} {}", file_type, count);
            }
        }
        Commands::Search { query, limit } => {
            let index = Arc::new(SharedIndex::new());
            build_index(&cfg, &index)?;

            let retrieval = RetrievalService::new(
                Arc::clone(&index),
                limit.unwrap_or(cfg.retrieval.top_k),
                cfg.retrieval.min_similarity,
            );
            match retrieval.search(&query)? {
                SearchResponse::NotIndexed => {
                    println!("Nothing is indexed. Check [indexing] paths and extensions.");
                }
                SearchResponse::Hits(hits) if hits.is_empty() => {
                    println!("No matches for \"{}\".", query);
                }
                SearchResponse::Hits(hits) => {
                    for hit in hits {
                        println!("{:.4}  {}", hit.score, hit.document.source_path);
                    }
                }
            }
        }
        Commands::Rank { refresh, limit } => {
            let index = Arc::new(SharedIndex::new());
            // The RAG component needs an index; skip the walk entirely when
            // its weight is zero.
            if cfg.scoring.weights.rag_relevance > 0.0 {
                build_index(&cfg, &index)?;
            }

            let retrieval = Arc::new(RetrievalService::new(
                Arc::clone(&index),
                cfg.retrieval.top_k,
                cfg.retrieval.min_similarity,
            ));
            let calculator = PriorityCalculator::new(retrieval, &cfg.scoring)?;
            let client = GitHubClient::new(
                std::env::var("GITHUB_TOKEN").ok(),
                Duration::from_secs(cfg.github.timeout_secs),
            )?;
            let cache = IssueCache::new(&cfg.cache.file_path, cfg.cache.ttl_minutes);
            let service = TriageService::new(
                client,
                calculator,
                cache,
                cfg.github.clone(),
                cfg.cache.enabled,
            )?;

            let issues = service.ranked_issues(refresh).await?;
            let shown = limit.unwrap_or(issues.len());
            println!(
                "{:<6} {:>8} {:>8} {:>8} {:>8} {:>8}  TITLE",
                "ISSUE", "SCORE", "COMMITS", "ACT", "REC", "RAG"
            );
            for scored in issues.iter().take(shown) {
                println!(
                    "#{:<5} {:>8.4} {:>8} {:>8.4} {:>8.4} {:>8.4}  {}",
                    scored.issue.number,
                    scored.priority_score,
                    scored.commit_count,
                    scored.commit_score,
                    scored.recency_score,
                    scored.rag_score,
                    scored.issue.title,
                );
            }
        }
        Commands::Cache { action } => {
            let cache = IssueCache::new(&cfg.cache.file_path, cfg.cache.ttl_minutes);
            match action {
                CacheAction::Info => {
                    let info = cache.cache_info();
                    if !info.exists {
                        println!("No cache at {}", cfg.cache.file_path.display());
                    } else {
                        println!("Cache:        {}", cfg.cache.file_path.display());
                        println!("Size:         {} bytes", info.size);
                        println!(
                            "Last updated: {}",
                            info.last_updated.as_deref().unwrap_or("unknown")
                        );
                        println!("Issues:       {}", info.issues_count);
                    }
                }
                CacheAction::Clear => {
                    cache.clear()?;
                    println!("Cache cleared.");
                }
            }
        }
    }

    Ok(())
}

fn build_index(cfg: &Config, index: &SharedIndex) -> Result<repo_triage::models::IndexStats> {
    let indexer = DocumentIndexer::new(cfg.indexing.clone());
    indexer.index_directory(&cfg.indexing.root, index, &StderrProgress)
}
