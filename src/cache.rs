//! JSON file cache for the last scored issue list.
//!
//! The cache is replaced wholesale on every `save` and invalidated purely
//! by TTL or an explicit `clear` — there is no partial invalidation. A
//! missing file and an expired file are deliberately indistinguishable to
//! callers: both mean "recompute". File operations share one mutex so a
//! concurrent save can never produce a truncated read.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::models::{CachedIssue, CachedIssuesData, ScoredIssue};

#[derive(Debug, Clone)]
pub struct CacheInfo {
    pub exists: bool,
    pub size: u64,
    pub last_updated: Option<String>,
    pub issues_count: usize,
}

pub struct IssueCache {
    path: PathBuf,
    ttl: Duration,
    file_lock: Mutex<()>,
}

impl IssueCache {
    pub fn new(path: impl Into<PathBuf>, ttl_minutes: u64) -> Self {
        Self {
            path: path.into(),
            ttl: Duration::minutes(ttl_minutes as i64),
            file_lock: Mutex::new(()),
        }
    }

    /// Load the cached list, or `None` when the file is missing, unreadable,
    /// or older than the TTL.
    pub fn load(&self) -> Option<CachedIssuesData> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());

        if !self.path.exists() {
            debug!(path = %self.path.display(), "cache file does not exist");
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read cache");
                return None;
            }
        };

        let data: CachedIssuesData = match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse cache");
                return None;
            }
        };

        let Ok(last_updated) = DateTime::parse_from_rfc3339(&data.last_updated) else {
            warn!(stamp = %data.last_updated, "cache has an unparseable timestamp");
            return None;
        };

        let age = Utc::now() - last_updated.with_timezone(&Utc);
        if age > self.ttl {
            info!(age_minutes = age.num_minutes(), "cache is expired");
            return None;
        }

        info!(
            issues = data.issues.len(),
            age_minutes = age.num_minutes(),
            "loaded issues from cache"
        );
        Some(data)
    }

    /// Overwrite the cache with a fresh `last_updated = now` stamp.
    pub fn save(&self, issues: &[ScoredIssue]) -> Result<()> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create cache dir {}", parent.display()))?;
            }
        }

        let data = CachedIssuesData {
            issues: issues.iter().map(CachedIssue::from_scored).collect(),
            last_updated: Utc::now().to_rfc3339(),
        };

        let content = serde_json::to_string_pretty(&data)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("write cache {}", self.path.display()))?;

        info!(issues = issues.len(), path = %self.path.display(), "saved cache");
        Ok(())
    }

    /// Reconstruct scored issues from a cached payload. Lossless for the
    /// scores; issue bodies, labels, and linked commits are not cached.
    pub fn from_cache(&self, data: CachedIssuesData) -> Vec<ScoredIssue> {
        data.issues
            .into_iter()
            .map(CachedIssue::into_scored)
            .collect()
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());

        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("remove cache {}", self.path.display()))?;
            info!(path = %self.path.display(), "cleared cache");
        }
        Ok(())
    }

    pub fn cache_info(&self) -> CacheInfo {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());

        let Ok(metadata) = std::fs::metadata(&self.path) else {
            return CacheInfo {
                exists: false,
                size: 0,
                last_updated: None,
                issues_count: 0,
            };
        };

        let parsed: Option<CachedIssuesData> = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok());

        CacheInfo {
            exists: true,
            size: metadata.len(),
            last_updated: parsed.as_ref().map(|d| d.last_updated.clone()),
            issues_count: parsed.map(|d| d.issues.len()).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Issue;
    use tempfile::TempDir;

    fn scored(number: u64, priority: f64) -> ScoredIssue {
        ScoredIssue {
            issue: Issue {
                number,
                title: format!("Issue {number}"),
                body: Some("body".to_string()),
                state: "open".to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-02T00:00:00Z".to_string(),
                labels: Vec::new(),
                user: None,
            },
            priority_score: priority,
            commit_count: 3,
            commit_score: 0.06,
            recency_score: 0.8,
            rag_score: 0.25,
            linked_commits: Vec::new(),
        }
    }

    #[test]
    fn missing_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = IssueCache::new(tmp.path().join("cache.json"), 60);
        assert!(cache.load().is_none());
        let info = cache.cache_info();
        assert!(!info.exists);
        assert_eq!(info.issues_count, 0);
    }

    #[test]
    fn save_then_load_within_ttl() {
        let tmp = TempDir::new().unwrap();
        let cache = IssueCache::new(tmp.path().join("nested/dir/cache.json"), 60);

        let issues = vec![scored(1, 0.9), scored(2, 0.4)];
        cache.save(&issues).unwrap();

        let data = cache.load().expect("fresh cache must hit");
        assert_eq!(data.issues.len(), 2);

        let restored = cache.from_cache(data);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].issue.number, 1);
        // Component scores survive the round trip.
        assert!((restored[0].commit_score - 0.06).abs() < 1e-12);
        assert!((restored[0].recency_score - 0.8).abs() < 1e-12);
        assert!((restored[0].rag_score - 0.25).abs() < 1e-12);
        assert!((restored[0].priority_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn expired_cache_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        let cache = IssueCache::new(&path, 60);

        cache.save(&[scored(1, 0.5)]).unwrap();

        // Backdate the stamp past the TTL.
        let mut data: CachedIssuesData =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        data.last_updated = (Utc::now() - Duration::minutes(120)).to_rfc3339();
        std::fs::write(&path, serde_json::to_string_pretty(&data).unwrap()).unwrap();

        assert!(cache.load().is_none());
        // Info still reports the file as present.
        assert!(cache.cache_info().exists);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let cache = IssueCache::new(tmp.path().join("cache.json"), 60);

        cache.save(&[scored(1, 0.5), scored(2, 0.4)]).unwrap();
        cache.save(&[scored(3, 0.9)]).unwrap();

        let data = cache.load().unwrap();
        assert_eq!(data.issues.len(), 1);
        assert_eq!(data.issues[0].number, 3);
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let cache = IssueCache::new(&path, 60);
        assert!(cache.load().is_none());
    }

    #[test]
    fn clear_removes_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        let cache = IssueCache::new(&path, 60);

        cache.save(&[scored(1, 0.5)]).unwrap();
        assert!(path.exists());

        cache.clear().unwrap();
        assert!(!path.exists());
        assert!(cache.load().is_none());
        // Clearing an already-empty cache is fine.
        cache.clear().unwrap();
    }
}
