//! GitHub data for the portfolio page
//!
//! `GithubClient` talks to the GraphQL API; `PortfolioSource` puts the cache in
//! front of it. The types here are what gets cached and rendered, so they
//! derive both `Serialize` and `Deserialize`.

pub mod client;
pub mod source;

pub use client::{GithubClient, GithubError, DEFAULT_GRAPHQL_ENDPOINT};
pub use source::{PortfolioSource, SourceSettings};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A GitHub user's public profile and activity summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubProfile {
    pub login: String,
    /// Display name, if the user set one
    pub name: Option<String>,
    pub bio: Option<String>,
    /// Whether the user is marked as available for hire
    pub is_hireable: bool,
    pub avatar_url: String,
    pub location: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub repositories: u64,
    pub pull_requests: u64,
    pub issues: u64,
    /// Commit contributions over the last year
    pub total_commits: u64,
    /// Contribution calendar, oldest week first
    pub contribution_weeks: Vec<ContributionWeek>,
}

impl GithubProfile {
    /// Name to show on the page, falling back to the login
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }

    /// "Yes"/"No" label for the hireable flag
    pub fn hireable_label(&self) -> &'static str {
        if self.is_hireable {
            "Yes"
        } else {
            "No"
        }
    }
}

/// One week of the contribution calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionWeek {
    pub days: Vec<ContributionDay>,
}

/// Contributions on a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
    /// Hex colour GitHub uses for this day's intensity
    pub color: String,
}

/// A repository pinned on the user's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedRepo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub fork_count: u64,
    pub stars: u64,
    pub url: String,
    /// Size on disk in kilobytes
    pub disk_usage: Option<u64>,
    pub primary_language: Option<Language>,
}

/// Repository language as reported by GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub color: Option<String>,
}
