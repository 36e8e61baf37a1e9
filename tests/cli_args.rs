//! Integration tests for CLI argument handling
//!
//! Runs the built binary in `--plain --offline` mode so nothing touches the
//! network or the terminal.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ghfolio"))
        .args(args)
        .env_remove("GITHUB_TOKEN")
        .env_remove("GHFOLIO_CONFIG")
        .env_remove("GHFOLIO_ANALYTICS_KEY")
        .env_remove("GHFOLIO_ANALYTICS_HOST")
        .output()
        .expect("Failed to execute ghfolio")
}

fn run_plain(cache_dir: &Path, extra: &[&str]) -> std::process::Output {
    let dir = cache_dir.to_str().expect("utf-8 temp path");
    let mut args = vec!["--plain", "--offline", "--cache-dir", dir];
    args.extend_from_slice(extra);
    run_cli(&args)
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ghfolio"), "Help should mention ghfolio");
    assert!(stdout.contains("--offline"), "Help should mention --offline flag");
    assert!(stdout.contains("--ttl-hours"), "Help should mention --ttl-hours flag");
}

#[test]
fn test_invalid_user_prints_error_and_exits() {
    let output = run_cli(&["--plain", "--offline", "--user", "dou--ble"]);
    assert!(!output.status.success(), "Expected invalid login to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("github.username"),
        "Should name the invalid field: {}",
        stderr
    );
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.toml");
    let output = run_cli(&["--plain", "--offline", "--config", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config"), "Should mention the config file: {}", stderr);
}

#[test]
fn test_offline_without_cache_shows_contact_block() {
    let dir = TempDir::new().unwrap();

    let output = run_plain(dir.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Contact Me"), "Expected contact fallback: {}", stdout);
    assert!(!stdout.contains("Open Source Projects"));
    assert!(stdout.contains("profile: unavailable | projects: unavailable"));
    // Nothing was fetched, so nothing was cached
    assert!(!dir.path().join("gh_pinned_v1_octocat.json").exists());
}

#[test]
fn test_offline_serves_expired_cache() {
    let dir = TempDir::new().unwrap();
    let entry = r#"{
        "timestamp": "2001-01-01T00:00:00Z",
        "payload": [{
            "id": "R_1",
            "name": "hello-world",
            "description": "My first repository",
            "fork_count": 3,
            "stars": 9,
            "url": "https://github.com/octocat/hello-world",
            "disk_usage": null,
            "primary_language": null
        }]
    }"#;
    std::fs::write(dir.path().join("gh_pinned_v1_octocat.json"), entry).unwrap();

    let output = run_plain(dir.path(), &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello-world"), "Expected cached repo: {}", stdout);
    assert!(stdout.contains("projects: stale"));
}

#[test]
fn test_user_flag_selects_cache_key() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("gh_pinned_v1_lcsvcn.json"),
        r#"{"timestamp": "2001-01-01T00:00:00Z", "payload": []}"#,
    )
    .unwrap();

    let output = run_plain(dir.path(), &["--user", "lcsvcn"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No pinned repositories yet."), "{}", stdout);
    assert!(stdout.contains("https://github.com/lcsvcn"));
}

#[test]
fn test_config_file_content_is_used() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("ghfolio.toml");
    std::fs::write(
        &config,
        r#"
        [contact]
        title = "Say hello"
        email = "octocat@example.com"
        "#,
    )
    .unwrap();

    let output = run_plain(dir.path(), &["--config", config.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Say hello"));
    assert!(stdout.contains("mailto:octocat@example.com"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use ghfolio::cli::{Cli, StartupConfig};
    use ghfolio::config::PortfolioConfig;

    #[test]
    fn test_cli_no_args_uses_config_defaults() {
        let cli = Cli::parse_from(["ghfolio"]);
        let config = StartupConfig::merge(&cli, PortfolioConfig::default()).unwrap();
        assert_eq!(config.portfolio.github.username, "octocat");
        assert!(!config.offline);
        assert!(!config.plain);
    }

    #[test]
    fn test_cli_ttl_zero_is_accepted() {
        let cli = Cli::parse_from(["ghfolio", "--ttl-hours", "0"]);
        let config = StartupConfig::merge(&cli, PortfolioConfig::default()).unwrap();
        assert!(config.source_settings().profile_ttl.is_zero());
    }

    #[test]
    fn test_cli_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["ghfolio", "--plan"]).is_err());
    }
}
