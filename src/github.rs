//! GitHub REST client for issues and commits.
//!
//! A thin, opaque collaborator from the engine's point of view: every call
//! carries a hard timeout (the calculator must never block indefinitely on
//! a slow upstream) and failures come back as wrapped `Result`s. No retry
//! here — retry policy belongs to the caller's transport layer.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};

use crate::models::{Commit, Issue};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub caps `per_page` at 100.
fn per_page(limit: usize) -> usize {
    limit.min(100)
}

pub struct GitHubClient {
    http: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-triage/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            http,
            token,
            base_url: GITHUB_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API root (GitHub Enterprise, or a
    /// local stub in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }

    /// `GET /repos/{owner}/{repo}/issues`, most recently updated first.
    pub async fn get_issues(
        &self,
        owner: &str,
        repo: &str,
        state: &str,
        limit: usize,
    ) -> Result<Vec<Issue>> {
        debug!(owner, repo, state, limit, "fetching issues");

        let url = format!("{}/repos/{}/{}/issues", self.base_url, owner, repo);
        let issues: Vec<Issue> = self
            .request(reqwest::Method::GET, url)
            .query(&[
                ("state", state.to_string()),
                ("per_page", per_page(limit).to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("fetch issues for {owner}/{repo}"))?
            .error_for_status()
            .with_context(|| format!("fetch issues for {owner}/{repo}"))?
            .json()
            .await
            .with_context(|| format!("decode issues for {owner}/{repo}"))?;

        info!(owner, repo, count = issues.len(), "fetched issues");
        Ok(issues)
    }

    /// `GET /repos/{owner}/{repo}/commits`.
    pub async fn get_commits(&self, owner: &str, repo: &str, limit: usize) -> Result<Vec<Commit>> {
        debug!(owner, repo, limit, "fetching commits");

        let url = format!("{}/repos/{}/{}/commits", self.base_url, owner, repo);
        let commits: Vec<Commit> = self
            .request(reqwest::Method::GET, url)
            .query(&[("per_page", per_page(limit).to_string())])
            .send()
            .await
            .with_context(|| format!("fetch commits for {owner}/{repo}"))?
            .error_for_status()
            .with_context(|| format!("fetch commits for {owner}/{repo}"))?
            .json()
            .await
            .with_context(|| format!("decode commits for {owner}/{repo}"))?;

        info!(owner, repo, count = commits.len(), "fetched commits");
        Ok(commits)
    }

    /// `POST /repos/{owner}/{repo}/issues`.
    pub async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: Option<&str>,
        labels: &[String],
    ) -> Result<Issue> {
        let url = format!("{}/repos/{}/{}/issues", self.base_url, owner, repo);
        let payload = json!({
            "title": title,
            "body": body,
            "labels": labels,
        });

        let issue: Issue = self
            .request(reqwest::Method::POST, url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("create issue in {owner}/{repo}"))?
            .error_for_status()
            .with_context(|| format!("create issue in {owner}/{repo}"))?
            .json()
            .await
            .with_context(|| format!("decode created issue in {owner}/{repo}"))?;

        info!(owner, repo, number = issue.number, "created issue");
        Ok(issue)
    }
}
