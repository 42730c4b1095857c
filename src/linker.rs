//! Commit-to-issue linkage via commit-message reference patterns.
//!
//! A heuristic by contract: unreferenced commits are missed and a
//! coincidental "fixes #12" in prose is a false positive. Both are accepted
//! trade-offs; richer timeline-based linkage is out of scope.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Commit, Issue, LinkedIssue};

fn issue_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:fixes|fix|closes|close|refs|ref|related to)\s+#(\d+)")
            .expect("issue reference pattern is valid")
    })
}

/// Issue numbers referenced by a commit message. A single message may
/// reference several issues; duplicates are preserved in match order.
pub fn referenced_issues(message: &str) -> Vec<u64> {
    issue_ref_pattern()
        .captures_iter(message)
        .filter_map(|captures| captures.get(1)?.as_str().parse().ok())
        .collect()
}

/// Attribute commits to issues by reference pattern.
///
/// Every input issue appears in the output in input order; issues nothing
/// references get an explicit empty commit list. A commit referencing
/// several issues is added to each of their lists.
pub fn link_commits(issues: &[Issue], commits: &[Commit]) -> Vec<LinkedIssue> {
    let mut position: HashMap<u64, usize> = HashMap::new();
    let mut linked: Vec<LinkedIssue> = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| {
            position.insert(issue.number, i);
            LinkedIssue {
                issue: issue.clone(),
                commits: Vec::new(),
            }
        })
        .collect();

    for commit in commits {
        for number in referenced_issues(&commit.details.message) {
            if let Some(&i) = position.get(&number) {
                linked[i].commits.push(commit.clone());
            }
        }
    }

    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitAuthor, CommitDetails};

    fn issue(number: u64) -> Issue {
        Issue {
            number,
            title: format!("Issue {number}"),
            body: None,
            state: "open".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-02T00:00:00Z".to_string(),
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
                    name: "dev".to_string(),
                    email: None,
                    date: "2026-01-03T00:00:00Z".to_string(),
                },
            },
            author: None,
        }
    }

    #[test]
    fn one_commit_links_to_multiple_issues() {
        let issues = vec![issue(12), issue(34), issue(56)];
        let commits = vec![commit("abc", "Fixes #12 and refs #34")];

        let linked = link_commits(&issues, &commits);
        assert_eq!(linked.len(), 3);
        assert_eq!(linked[0].commits.len(), 1);
        assert_eq!(linked[1].commits.len(), 1);
        assert!(linked[2].commits.is_empty());
    }

    #[test]
    fn unreferenced_commit_links_to_nothing() {
        let issues = vec![issue(1)];
        let commits = vec![commit("abc", "Refactor parser internals")];

        let linked = link_commits(&issues, &commits);
        assert!(linked[0].commits.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let issues = vec![issue(7)];
        let commits = vec![
            commit("a", "CLOSES #7"),
            commit("b", "Related To #7: follow-up"),
            commit("c", "fix #7"),
        ];

        let linked = link_commits(&issues, &commits);
        assert_eq!(linked[0].commits.len(), 3);
    }

    #[test]
    fn references_to_unknown_issues_are_ignored() {
        let issues = vec![issue(1)];
        let commits = vec![commit("a", "fixes #999")];

        let linked = link_commits(&issues, &commits);
        assert!(linked[0].commits.is_empty());
    }

    #[test]
    fn bare_number_without_keyword_does_not_link() {
        let issues = vec![issue(5)];
        let commits = vec![commit("a", "see #5"), commit("b", "#5 again")];

        let linked = link_commits(&issues, &commits);
        assert!(linked[0].commits.is_empty());
    }

    #[test]
    fn output_preserves_input_issue_order() {
        let issues = vec![issue(30), issue(10), issue(20)];
        let linked = link_commits(&issues, &[]);
        let numbers: Vec<u64> = linked.iter().map(|l| l.issue.number).collect();
        assert_eq!(numbers, vec![30, 10, 20]);
    }

    #[test]
    fn referenced_issues_extracts_all_matches() {
        assert_eq!(
            referenced_issues("fix #1, closes #2, related to #3"),
            vec![1, 2, 3]
        );
        assert!(referenced_issues("no references here").is_empty());
    }
}
