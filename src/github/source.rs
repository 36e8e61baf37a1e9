//! Cached GitHub data for the page
//!
//! Each resource gets a versioned cache key (`gh:profile:v1:<login>`,
//! `gh:pinned:v1:<login>`). Bump the version whenever the matching GraphQL
//! query changes shape so old payloads are never decoded as the new type.

use std::time::Duration;

use tracing::warn;

use super::{GithubClient, GithubProfile, PinnedRepo};
use crate::cache::{CacheKey, CachedFetcher, Clock, FetchOutcome, KeyValueStore, SystemClock};

const PROFILE_NAMESPACE: &str = "gh:profile";
const PROFILE_SCHEMA_VERSION: u32 = 1;
const PINNED_NAMESPACE: &str = "gh:pinned";
const PINNED_SCHEMA_VERSION: u32 = 1;

/// Who to fetch and how long results stay fresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub login: String,
    pub profile_ttl: Duration,
    pub pinned_ttl: Duration,
    /// Never touch the network; serve whatever is cached
    pub offline: bool,
}

/// GitHub client behind a cache-first fetcher
pub struct PortfolioSource<S, C = SystemClock> {
    client: GithubClient,
    fetcher: CachedFetcher<S, C>,
    settings: SourceSettings,
}

impl<S: KeyValueStore, C: Clock> PortfolioSource<S, C> {
    pub fn new(client: GithubClient, fetcher: CachedFetcher<S, C>, settings: SourceSettings) -> Self {
        Self {
            client,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// Whether a network fetch may be attempted (token present, not offline)
    pub fn has_credential(&self) -> bool {
        !self.settings.offline && self.client.has_token()
    }

    pub fn profile_key(&self) -> Option<CacheKey> {
        self.key(PROFILE_NAMESPACE, PROFILE_SCHEMA_VERSION)
    }

    pub fn pinned_key(&self) -> Option<CacheKey> {
        self.key(PINNED_NAMESPACE, PINNED_SCHEMA_VERSION)
    }

    /// Resolves the user's profile
    pub async fn profile(&self) -> FetchOutcome<GithubProfile> {
        let Some(key) = self.profile_key() else {
            return FetchOutcome::Unavailable;
        };
        let login = self.settings.login.as_str();
        self.fetcher
            .resolve_gated(&key, self.settings.profile_ttl, self.gate(), || {
                self.client.fetch_profile(login)
            })
            .await
    }

    /// Resolves the user's pinned repositories
    pub async fn pinned_repos(&self) -> FetchOutcome<Vec<PinnedRepo>> {
        let Some(key) = self.pinned_key() else {
            return FetchOutcome::Unavailable;
        };
        let login = self.settings.login.as_str();
        self.fetcher
            .resolve_gated(&key, self.settings.pinned_ttl, self.gate(), || {
                self.client.fetch_pinned(login)
            })
            .await
    }

    fn key(&self, namespace: &str, version: u32) -> Option<CacheKey> {
        match CacheKey::versioned(namespace, version, &self.settings.login) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(namespace, error = %e, "no GitHub login configured");
                None
            }
        }
    }

    fn gate(&self) -> bool {
        if self.settings.offline {
            return false;
        }
        self.client.has_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStore};
    use crate::github::{ContributionWeek, Language};

    const HOUR: Duration = Duration::from_secs(3600);

    fn settings(login: &str, offline: bool) -> SourceSettings {
        SourceSettings {
            login: login.to_string(),
            profile_ttl: HOUR,
            pinned_ttl: HOUR,
            offline,
        }
    }

    fn create_source(
        token: Option<&str>,
        offline: bool,
    ) -> (PortfolioSource<MemoryStore, ManualClock>, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(0);
        let client = GithubClient::new(token.map(str::to_string))
            // Nothing listens here; any request fails fast
            .with_endpoint("http://127.0.0.1:9/graphql");
        let source = PortfolioSource::new(
            client,
            CachedFetcher::with_clock(store.clone(), clock.clone()),
            settings("octocat", offline),
        );
        (source, store, clock)
    }

    fn repo() -> PinnedRepo {
        PinnedRepo {
            id: "R_1".to_string(),
            name: "hello-world".to_string(),
            description: None,
            fork_count: 1,
            stars: 2,
            url: "https://github.com/octocat/hello-world".to_string(),
            disk_usage: None,
            primary_language: Some(Language {
                name: "Rust".to_string(),
                color: None,
            }),
        }
    }

    fn seed<T: serde::Serialize>(store: &MemoryStore, key: &CacheKey, at: &str, payload: &T) {
        let body = serde_json::json!({ "timestamp": at, "payload": payload });
        store
            .set(key.as_str(), body.to_string().as_bytes())
            .expect("seed write");
    }

    #[test]
    fn test_cache_keys_are_versioned_per_login() {
        let (source, _store, _clock) = create_source(None, false);
        assert_eq!(source.profile_key().unwrap().as_str(), "gh:profile:v1:octocat");
        assert_eq!(source.pinned_key().unwrap().as_str(), "gh:pinned:v1:octocat");
    }

    #[test]
    fn test_has_credential() {
        assert!(!create_source(None, false).0.has_credential());
        assert!(!create_source(Some("ghp_x"), true).0.has_credential());
        assert!(create_source(Some("ghp_x"), false).0.has_credential());
    }

    #[tokio::test]
    async fn test_missing_token_without_cache_is_unavailable() {
        let (source, store, _clock) = create_source(None, false);

        assert_eq!(source.pinned_repos().await, FetchOutcome::Unavailable);
        assert_eq!(source.profile().await, FetchOutcome::Unavailable);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_serves_stale_cache() {
        let (source, store, clock) = create_source(None, false);
        let key = source.pinned_key().unwrap();
        seed(&store, &key, "1970-01-01T00:00:00Z", &vec![repo()]);
        clock.set_millis(2 * 3_600_000);

        let outcome = source.pinned_repos().await;

        assert_eq!(outcome, FetchOutcome::StaleFallback(vec![repo()]));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_missing_token_warns_only_when_cache_is_stale() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (source, store, clock) = create_source(None, false);
        let key = source.pinned_key().unwrap();
        seed(&store, &key, "1970-01-01T00:00:00Z", &vec![repo()]);

        assert_eq!(source.pinned_repos().await, FetchOutcome::Fresh(vec![repo()]));
        assert!(logs.contents().is_empty(), "unexpected log: {}", logs.contents());

        clock.set_millis(2 * 3_600_000);
        assert_eq!(source.pinned_repos().await, FetchOutcome::StaleFallback(vec![repo()]));
        assert!(logs.contents().contains("fetch skipped"));
    }

    #[tokio::test]
    async fn test_offline_serves_fresh_cache() {
        let (source, store, _clock) = create_source(Some("ghp_x"), true);
        let key = source.pinned_key().unwrap();
        seed(&store, &key, "1970-01-01T00:00:00Z", &Vec::<PinnedRepo>::new());

        let outcome = source.pinned_repos().await;

        assert_eq!(outcome, FetchOutcome::Fresh(Vec::new()));
    }

    #[tokio::test]
    async fn test_network_failure_falls_back_to_stale_profile() {
        let (source, store, clock) = create_source(Some("ghp_x"), false);
        let profile = GithubProfile {
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            bio: None,
            is_hireable: true,
            avatar_url: "https://example.com/a.png".to_string(),
            location: None,
            followers: 1,
            following: 2,
            repositories: 3,
            pull_requests: 4,
            issues: 5,
            total_commits: 6,
            contribution_weeks: vec![ContributionWeek { days: Vec::new() }],
        };
        seed(&store, &source.profile_key().unwrap(), "1970-01-01T00:00:00Z", &profile);
        clock.set_millis(2 * 3_600_000);

        let outcome = source.profile().await;

        assert_eq!(outcome, FetchOutcome::StaleFallback(profile));
    }

    #[tokio::test]
    async fn test_empty_login_is_unavailable() {
        let store = MemoryStore::new();
        let source = PortfolioSource::new(
            GithubClient::new(Some("ghp_x".to_string())),
            CachedFetcher::with_clock(store, ManualClock::at_millis(0)),
            settings("", false),
        );

        assert!(source.profile_key().is_none());
        assert_eq!(source.profile().await, FetchOutcome::Unavailable);
    }
}
