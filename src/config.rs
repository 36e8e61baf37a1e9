//! Portfolio configuration
//!
//! Page content and integration settings are read from an optional TOML file.
//! Every field has a default, so an empty file (or none at all) yields a working
//! page. Secrets are not read from the file: the GitHub token comes from the
//! command line or `GITHUB_TOKEN`, and the analytics key may come from
//! `GHFOLIO_ANALYTICS_KEY`.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::github::DEFAULT_GRAPHQL_ENDPOINT;

/// Default freshness window for cached GitHub data
const DEFAULT_TTL_HOURS: u64 = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    pub owner: OwnerConfig,
    pub contact: ContactConfig,
    pub github: GithubConfig,
    pub analytics: AnalyticsConfig,
    pub links: Vec<LinkConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OwnerConfig {
    pub name: String,
    pub title: String,
    pub subtitle: String,
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactConfig {
    pub title: String,
    pub subtitle: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    pub username: String,
    /// Show the GitHub profile card instead of the contact block when data is available
    pub show_profile: bool,
    pub profile_ttl_hours: u64,
    pub pinned_ttl_hours: u64,
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Project API key; events are only sent when both key and host are set
    pub key: Option<String>,
    pub host: Option<String>,
    /// Page path reported with every event
    pub path: Option<String>,
}

/// An outbound link shown on the page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub label: String,
    pub href: String,
    /// Stable analytics id for the link
    pub id: Option<String>,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            name: "The Octocat".to_string(),
            title: "Hi all, I'm Octocat".to_string(),
            subtitle: "A software developer who enjoys building things.".to_string(),
            resume_url: None,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            title: "Contact Me".to_string(),
            subtitle: "Discuss a project or just want to say hi? My inbox is open for all.".to_string(),
            email: None,
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: "octocat".to_string(),
            show_profile: true,
            profile_ttl_hours: DEFAULT_TTL_HOURS,
            pinned_ttl_hours: DEFAULT_TTL_HOURS,
            endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
        }
    }
}

impl GithubConfig {
    pub fn profile_ttl(&self) -> Duration {
        hours(self.profile_ttl_hours)
    }

    pub fn pinned_ttl(&self) -> Duration {
        hours(self.pinned_ttl_hours)
    }

    /// Public profile URL for the configured user
    pub fn profile_url(&self) -> String {
        format!("https://github.com/{}", self.username)
    }
}

impl AnalyticsConfig {
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("/")
    }

    /// Key and host, if both are configured and non-empty
    pub fn capture_target(&self) -> Option<(&str, &str)> {
        let key = self.key.as_deref().filter(|k| !k.trim().is_empty())?;
        let host = self.host.as_deref().filter(|h| !h.trim().is_empty())?;
        Some((key, host))
    }
}

fn hours(h: u64) -> Duration {
    Duration::from_secs(h.saturating_mul(3600))
}

impl PortfolioConfig {
    /// Loads configuration from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Fills analytics settings from environment-style lookups
    ///
    /// `GHFOLIO_ANALYTICS_KEY` and `GHFOLIO_ANALYTICS_HOST` override the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GHFOLIO_ANALYTICS_KEY") {
            self.analytics.key = Some(key);
        }
        if let Some(host) = lookup("GHFOLIO_ANALYTICS_HOST") {
            self.analytics.host = Some(host);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_login(&self.github.username)?;
        let endpoint = self.github.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "github.endpoint",
                reason: "must be an http(s) URL".to_string(),
            });
        }
        for link in &self.links {
            if link.label.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "links.label",
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Checks a GitHub login: 1-39 characters, alphanumerics or single inner hyphens
pub fn validate_login(login: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        field: "github.username",
        reason: reason.to_string(),
    };

    if login.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if login.len() > 39 {
        return Err(invalid("must be at most 39 characters"));
    }
    if !login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid("may only contain letters, digits and hyphens"));
    }
    if login.starts_with('-') || login.ends_with('-') || login.contains("--") {
        return Err(invalid("hyphens must separate other characters"));
    }
    Ok(())
}
