//! Command-line interface parsing for ghfolio
//!
//! Handles the flags that override the configuration file: which GitHub user
//! to show, where the cache lives, the token, cache TTL and offline/plain modes.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{validate_login, ConfigError, PortfolioConfig};
use crate::github::SourceSettings;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file or an override is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// ghfolio - A terminal portfolio page with cached GitHub profile and pinned repositories
#[derive(Parser, Debug)]
#[command(name = "ghfolio")]
#[command(about = "Terminal portfolio page with cached GitHub data")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "GHFOLIO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for cached GitHub responses (defaults to the XDG cache dir)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// GitHub login to show, overriding the config file
    #[arg(long, value_name = "LOGIN")]
    pub user: Option<String>,

    /// GitHub access token used for GraphQL requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// How long cached GitHub data stays fresh; 0 refetches every run
    #[arg(long, value_name = "HOURS")]
    pub ttl_hours: Option<u64>,

    /// Never contact GitHub; show cached data only
    #[arg(long)]
    pub offline: bool,

    /// Print the page as plain text instead of opening the terminal UI
    #[arg(long)]
    pub plain: bool,
}

/// Everything the application needs at startup, merged from file and flags
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub portfolio: PortfolioConfig,
    pub token: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub offline: bool,
    pub plain: bool,
}

impl StartupConfig {
    /// Loads the config file (if any) and applies CLI overrides on top
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut portfolio = PortfolioConfig::load(cli.config.as_deref())?;
        portfolio.apply_env(|name| std::env::var(name).ok());
        Self::merge(cli, portfolio)
    }

    /// Applies CLI overrides to an already-loaded configuration
    pub fn merge(cli: &Cli, mut portfolio: PortfolioConfig) -> Result<Self, CliError> {
        if let Some(user) = &cli.user {
            validate_login(user)?;
            portfolio.github.username = user.clone();
        }
        if let Some(hours) = cli.ttl_hours {
            portfolio.github.profile_ttl_hours = hours;
            portfolio.github.pinned_ttl_hours = hours;
        }

        Ok(Self {
            portfolio,
            token: cli.token.clone().filter(|t| !t.trim().is_empty()),
            cache_dir: cli.cache_dir.clone(),
            offline: cli.offline,
            plain: cli.plain,
        })
    }

    /// Fetch settings for the GitHub data source
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            login: self.portfolio.github.username.clone(),
            profile_ttl: self.portfolio.github.profile_ttl(),
            pinned_ttl: self.portfolio.github.pinned_ttl(),
            offline: self.offline,
        }
    }
}
