use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_max_issues")]
    pub max_issues: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            max_issues: default_max_issues(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_issues() -> usize {
    30
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    /// Directory the indexer walks. Relative paths resolve against the cwd.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Extension allow-list (no leading dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Vectorization strategy, chosen once at startup: "tfidf" or "dense".
    #[serde(default = "default_vectorizer")]
    pub vectorizer: String,
    #[serde(default)]
    pub dense: DenseConfig,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: default_extensions(),
            exclude_globs: Vec::new(),
            vectorizer: default_vectorizer(),
            dense: DenseConfig::default(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "rs".to_string(), "txt".to_string()]
}
fn default_vectorizer() -> String {
    "tfidf".to_string()
}

/// Settings for the dense (neural) vectorizer. Only read when
/// `indexing.vectorizer = "dense"` and the `local-embeddings` feature is on.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DenseConfig {
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    256
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
        }
    }
}

fn default_top_k() -> usize {
    10
}
fn default_min_similarity() -> f64 {
    0.01
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_max_commits_for_normalization")]
    pub max_commits_for_normalization: usize,
    #[serde(default = "default_decay_days")]
    pub decay_days: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            max_commits_for_normalization: default_max_commits_for_normalization(),
            decay_days: default_decay_days(),
        }
    }
}

fn default_max_commits_for_normalization() -> usize {
    50
}
fn default_decay_days() -> f64 {
    30.0
}

/// Blend weights for the three component scorers. Must sum to exactly 1.0;
/// a bad sum is rejected, never renormalized.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Weights {
    pub commit_activity: f64,
    pub recency: f64,
    pub rag_relevance: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            commit_activity: 0.6,
            recency: 0.3,
            rag_relevance: 0.1,
        }
    }
}

impl Weights {
    pub fn validate(&self) -> Result<()> {
        let sum = self.commit_activity + self.recency + self.rag_relevance;
        if (sum - 1.0).abs() > 1e-9 {
            anyhow::bail!(
                "scoring.weights must sum to 1.0 (got {} + {} + {} = {})",
                self.commit_activity,
                self.recency,
                self.rag_relevance,
                sum
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    #[serde(default = "default_cache_path")]
    pub file_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_minutes: default_ttl_minutes(),
            file_path: default_cache_path(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_ttl_minutes() -> u64 {
    60
}
fn default_cache_path() -> PathBuf {
    PathBuf::from(".repo-triage/cache.json")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    config.scoring.weights.validate()?;

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if !(-1.0..=1.0).contains(&config.retrieval.min_similarity) {
        anyhow::bail!("retrieval.min_similarity must be in [-1.0, 1.0]");
    }

    if config.scoring.max_commits_for_normalization == 0 {
        anyhow::bail!("scoring.max_commits_for_normalization must be >= 1");
    }

    if config.scoring.decay_days <= 0.0 {
        anyhow::bail!("scoring.decay_days must be > 0");
    }

    if config.cache.ttl_minutes == 0 {
        anyhow::bail!("cache.ttl_minutes must be >= 1");
    }

    if config.indexing.extensions.is_empty() {
        anyhow::bail!("indexing.extensions must not be empty");
    }

    match config.indexing.vectorizer.as_str() {
        "tfidf" | "dense" => {}
        other => anyhow::bail!(
            "Unknown vectorizer: '{}'. Must be tfidf or dense.",
            other
        ),
    }

    if config.indexing.vectorizer == "dense" {
        if config.indexing.dense.model_path.is_none() {
            anyhow::bail!("indexing.dense.model_path required for the dense vectorizer");
        }
        if config.indexing.dense.tokenizer_path.is_none() {
            anyhow::bail!("indexing.dense.tokenizer_path required for the dense vectorizer");
        }
        if config.indexing.dense.max_length == 0 {
            anyhow::bail!("indexing.dense.max_length must be >= 1");
        }
    }

    Ok(())
}
