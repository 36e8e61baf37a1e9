//! GitHub GraphQL API client
//!
//! Fetches a user's profile and pinned repositories and maps the GraphQL
//! response into our own types. Parsing is kept separate from transport so it
//! can be tested against fixture bodies.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::{ContributionDay, ContributionWeek, GithubProfile, Language, PinnedRepo};

/// Public GitHub GraphQL endpoint
pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// Per-request timeout; the cache layer imposes none of its own
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of pinned items requested
const PINNED_LIMIT: u32 = 6;

const PROFILE_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    login
    name
    bio
    isHireable
    avatarUrl
    location
    followers { totalCount }
    following { totalCount }
    repositories(ownerAffiliations: OWNER) { totalCount }
    pullRequests { totalCount }
    issues { totalCount }
    contributionsCollection {
      totalCommitContributions
      contributionCalendar {
        weeks {
          contributionDays { date contributionCount color }
        }
      }
    }
  }
}
"#;

const PINNED_QUERY: &str = r#"
query($login: String!, $first: Int!) {
  user(login: $login) {
    pinnedItems(first: $first, types: [REPOSITORY]) {
      totalCount
      edges {
        node {
          ... on Repository {
            id
            name
            description
            forkCount
            stargazers { totalCount }
            url
            diskUsage
            primaryLanguage { name color }
          }
        }
      }
    }
  }
}
"#;

/// Errors that can occur when querying GitHub
#[derive(Debug, Error)]
pub enum GithubError {
    /// No access token is configured
    #[error("GitHub token not configured")]
    MissingToken,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Token rejected or lacks scope
    #[error("GitHub rejected the credentials (HTTP {0})")]
    Unauthorized(u16),

    /// Any other non-success status
    #[error("GitHub returned HTTP {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The GraphQL layer reported errors and returned no data
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The login does not exist
    #[error("GitHub user not found: {0}")]
    UserNotFound(String),
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UserData<U> {
    user: Option<U>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64,
}

fn total(count: Option<TotalCount>) -> u64 {
    count.map(|c| c.total_count).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    #[serde(default)]
    is_hireable: bool,
    avatar_url: String,
    location: Option<String>,
    followers: Option<TotalCount>,
    following: Option<TotalCount>,
    repositories: Option<TotalCount>,
    pull_requests: Option<TotalCount>,
    issues: Option<TotalCount>,
    contributions_collection: Option<RawContributions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContributions {
    #[serde(default)]
    total_commit_contributions: u64,
    contribution_calendar: Option<RawCalendar>,
}

#[derive(Debug, Deserialize)]
struct RawCalendar {
    #[serde(default)]
    weeks: Vec<RawWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWeek {
    #[serde(default)]
    contribution_days: Vec<RawDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDay {
    date: chrono::NaiveDate,
    contribution_count: u32,
    color: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPinnedUser {
    pinned_items: RawPinnedItems,
}

#[derive(Debug, Deserialize)]
struct RawPinnedItems {
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    node: Option<RawRepo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRepo {
    id: String,
    name: String,
    description: Option<String>,
    #[serde(default)]
    fork_count: u64,
    stargazers: Option<TotalCount>,
    url: String,
    disk_usage: Option<u64>,
    primary_language: Option<Language>,
}

/// Client for the GitHub GraphQL API
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    endpoint: String,
    token: Option<String>,
}

impl GithubClient {
    /// Creates a client for the public endpoint; blank tokens count as missing
    pub fn new(token: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ghfolio/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Points the client at another GraphQL endpoint (GitHub Enterprise, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a fetch can be attempted at all
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Fetches the profile card data for `login`
    pub async fn fetch_profile(&self, login: &str) -> Result<GithubProfile, GithubError> {
        let body = self
            .query(PROFILE_QUERY, json!({ "login": login }))
            .await?;
        parse_profile_response(&body, login)
    }

    /// Fetches up to six pinned repositories for `login`
    pub async fn fetch_pinned(&self, login: &str) -> Result<Vec<PinnedRepo>, GithubError> {
        let body = self
            .query(PINNED_QUERY, json!({ "login": login, "first": PINNED_LIMIT }))
            .await?;
        parse_pinned_response(&body, login)
    }

    async fn query(&self, query: &str, variables: serde_json::Value) -> Result<String, GithubError> {
        let token = self.token.as_deref().ok_or(GithubError::MissingToken)?;

        debug!(endpoint = %self.endpoint, "sending GraphQL query");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GithubError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(GithubError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Pulls `data.user` out of a response, turning GraphQL errors into `GithubError`
fn extract_user<U>(response: GraphQlResponse<UserData<U>>, login: &str) -> Result<U, GithubError> {
    if let Some(user) = response.data.and_then(|d| d.user) {
        return Ok(user);
    }
    if response.errors.is_empty() {
        return Err(GithubError::UserNotFound(login.to_string()));
    }
    let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
    Err(GithubError::GraphQl(messages.join("; ")))
}

/// Parses a profile query response body
pub fn parse_profile_response(body: &str, login: &str) -> Result<GithubProfile, GithubError> {
    let response: GraphQlResponse<UserData<RawProfile>> = serde_json::from_str(body)?;
    let raw = extract_user(response, login)?;

    let (total_commits, contribution_weeks) = match raw.contributions_collection {
        Some(c) => {
            let weeks = c
                .contribution_calendar
                .map(|cal| cal.weeks)
                .unwrap_or_default()
                .into_iter()
                .map(|w| ContributionWeek {
                    days: w
                        .contribution_days
                        .into_iter()
                        .map(|d| ContributionDay {
                            date: d.date,
                            count: d.contribution_count,
                            color: d.color,
                        })
                        .collect(),
                })
                .collect();
            (c.total_commit_contributions, weeks)
        }
        None => (0, Vec::new()),
    };

    Ok(GithubProfile {
        login: raw.login,
        name: raw.name,
        bio: raw.bio,
        is_hireable: raw.is_hireable,
        avatar_url: raw.avatar_url,
        location: raw.location,
        followers: total(raw.followers),
        following: total(raw.following),
        repositories: total(raw.repositories),
        pull_requests: total(raw.pull_requests),
        issues: total(raw.issues),
        total_commits,
        contribution_weeks,
    })
}

/// Parses a pinned-items query response body
///
/// Edges with a null node are skipped.
pub fn parse_pinned_response(body: &str, login: &str) -> Result<Vec<PinnedRepo>, GithubError> {
    let response: GraphQlResponse<UserData<RawPinnedUser>> = serde_json::from_str(body)?;
    let user = extract_user(response, login)?;

    Ok(user
        .pinned_items
        .edges
        .into_iter()
        .filter_map(|edge| edge.node)
        .map(|repo| PinnedRepo {
            id: repo.id,
            name: repo.name,
            description: repo.description,
            fork_count: repo.fork_count,
            stars: total(repo.stargazers),
            url: repo.url,
            disk_usage: repo.disk_usage,
            primary_language: repo.primary_language,
        })
        .collect())
}
