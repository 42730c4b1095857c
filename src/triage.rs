//! End-to-end triage flow: fetch issues and commits, link them, score
//! them, and keep the scored list in the TTL cache.
//!
//! Refresh is caller-triggered (explicit call or a cache miss); there is
//! no background scheduler.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{CacheInfo, IssueCache};
use crate::config::GitHubConfig;
use crate::github::GitHubClient;
use crate::linker::link_commits;
use crate::models::ScoredIssue;
use crate::scoring::PriorityCalculator;

/// Sort highest priority first. Scoring itself guarantees no order.
pub fn sort_by_priority(issues: &mut [ScoredIssue]) {
    issues.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

pub struct TriageService {
    client: GitHubClient,
    calculator: PriorityCalculator,
    cache: IssueCache,
    github: GitHubConfig,
    cache_enabled: bool,
}

impl TriageService {
    /// Rejects a missing owner/repo up front, before any network work.
    pub fn new(
        client: GitHubClient,
        calculator: PriorityCalculator,
        cache: IssueCache,
        github: GitHubConfig,
        cache_enabled: bool,
    ) -> Result<Self> {
        if github.owner.is_empty() || github.repo.is_empty() {
            anyhow::bail!("github.owner and github.repo must be set");
        }
        Ok(Self {
            client,
            calculator,
            cache,
            github,
            cache_enabled,
        })
    }

    /// The scored, sorted issue list — from cache when it is still valid,
    /// otherwise recomputed and re-cached.
    pub async fn ranked_issues(&self, force_refresh: bool) -> Result<Vec<ScoredIssue>> {
        if self.cache_enabled && !force_refresh {
            if let Some(data) = self.cache.load() {
                let mut issues = self.cache.from_cache(data);
                sort_by_priority(&mut issues);
                return Ok(issues);
            }
        }

        let mut issues = self.refresh().await?;
        sort_by_priority(&mut issues);

        if self.cache_enabled {
            // A cache write failure downgrades to a warning; the freshly
            // computed result is still good.
            if let Err(e) = self.cache.save(&issues) {
                warn!(error = %e, "failed to save issue cache");
            }
        }

        Ok(issues)
    }

    async fn refresh(&self) -> Result<Vec<ScoredIssue>> {
        let owner = &self.github.owner;
        let repo = &self.github.repo;

        let issues = self
            .client
            .get_issues(owner, repo, "open", self.github.max_issues)
            .await
            .context("issue fetch failed")?;

        // A commit fetch failure degrades to zero linkage instead of
        // failing the whole scoring pass.
        let commits = match self
            .client
            .get_commits(owner, repo, self.github.max_issues * 2)
            .await
        {
            Ok(commits) => commits,
            Err(e) => {
                warn!(error = %e, "commit fetch failed, scoring without linkage");
                Vec::new()
            }
        };

        let linked = link_commits(&issues, &commits);
        info!(
            issues = issues.len(),
            commits = commits.len(),
            "linked commits to issues"
        );

        Ok(self.calculator.calculate_scores(&linked))
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.cache_info()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }
}
