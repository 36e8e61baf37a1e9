//! Integration tests for cache-first fetching
//!
//! Drives the public API with an in-memory store and a manual clock, and the
//! GitHub client against a mock GraphQL server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ghfolio::cache::{CacheKey, CachedFetcher, FetchOutcome, ManualClock, MemoryStore};
use ghfolio::github::{GithubClient, GithubError, PortfolioSource, SourceSettings};
use ghfolio::view::{PageState, ProfileSection, ProjectsSection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Counter {
    count: u32,
}

const TTL: Duration = Duration::from_millis(1000);

fn create_fetcher(start: i64) -> (CachedFetcher<MemoryStore, ManualClock>, ManualClock) {
    let clock = ManualClock::at_millis(start);
    (CachedFetcher::with_clock(MemoryStore::new(), clock.clone()), clock)
}

fn key() -> CacheKey {
    CacheKey::new("counter").unwrap()
}

async fn ok(count: u32) -> Result<Counter, String> {
    Ok(Counter { count })
}

async fn fail() -> Result<Counter, String> {
    Err("network down".to_string())
}

#[tokio::test]
async fn test_counter_scenario() {
    let (fetcher, clock) = create_fetcher(0);

    let first = fetcher.resolve(&key(), TTL, || ok(5)).await;
    assert_eq!(first, FetchOutcome::Refreshed(Counter { count: 5 }));

    clock.set_millis(500);
    let cached = fetcher.resolve(&key(), TTL, fail).await;
    assert_eq!(cached, FetchOutcome::Fresh(Counter { count: 5 }));

    clock.set_millis(1500);
    let refreshed = fetcher.resolve(&key(), TTL, || ok(7)).await;
    assert_eq!(refreshed, FetchOutcome::Refreshed(Counter { count: 7 }));
    let entry = fetcher.read_entry::<Counter>(&key()).unwrap();
    assert_eq!(entry.timestamp.timestamp_millis(), 1500);
    assert_eq!(entry.payload, Counter { count: 7 });

    // Written at 1500, so still inside the TTL at 2000
    clock.set_millis(2000);
    let still_fresh = fetcher.resolve(&key(), TTL, fail).await;
    assert_eq!(still_fresh, FetchOutcome::Fresh(Counter { count: 7 }));

    clock.set_millis(2500);
    let fallback = fetcher.resolve(&key(), TTL, fail).await;
    assert_eq!(fallback, FetchOutcome::StaleFallback(Counter { count: 7 }));
}

#[tokio::test]
async fn test_two_immediate_calls_are_idempotent() {
    let (fetcher, _clock) = create_fetcher(10_000);
    let calls = Arc::new(AtomicUsize::new(0));

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        let counted = calls.clone();
        outcomes.push(
            fetcher
                .resolve(&key(), TTL, move || {
                    counted.fetch_add(1, Ordering::SeqCst);
                    ok(1)
                })
                .await,
        );
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes[0], FetchOutcome::Refreshed(Counter { count: 1 }));
    assert_eq!(outcomes[1], outcomes[2]);
    assert_eq!(outcomes[1], FetchOutcome::Fresh(Counter { count: 1 }));
}

#[tokio::test]
async fn test_refresh_never_moves_timestamp_backwards() {
    let (fetcher, clock) = create_fetcher(0);
    fetcher.resolve(&key(), TTL, || ok(1)).await;

    clock.set_millis(5000);
    fetcher.resolve(&key(), TTL, || ok(2)).await;

    let entry = fetcher.read_entry::<Counter>(&key()).unwrap();
    assert!(entry.timestamp.timestamp_millis() >= 5000);
}

const PROFILE_BODY: &str = r##"{
  "data": {
    "user": {
      "login": "octocat",
      "name": "The Octocat",
      "bio": null,
      "isHireable": false,
      "avatarUrl": "https://avatars.githubusercontent.com/u/583231",
      "location": null,
      "followers": { "totalCount": 5 },
      "following": { "totalCount": 1 },
      "repositories": { "totalCount": 8 },
      "pullRequests": { "totalCount": 2 },
      "issues": { "totalCount": 0 },
      "contributionsCollection": null
    }
  }
}"##;

const PINNED_BODY: &str = r##"{
  "data": {
    "user": {
      "pinnedItems": {
        "totalCount": 1,
        "edges": [
          { "node": {
              "id": "R_1", "name": "hello-world", "description": null,
              "forkCount": 1, "stargazers": { "totalCount": 2 },
              "url": "https://github.com/octocat/hello-world", "diskUsage": null,
              "primaryLanguage": null } }
        ]
      }
    }
  }
}"##;

fn settings() -> SourceSettings {
    SourceSettings {
        login: "octocat".to_string(),
        profile_ttl: Duration::from_secs(3600),
        pinned_ttl: Duration::from_secs(3600),
        offline: false,
    }
}

#[tokio::test]
async fn test_client_sends_bearer_token_and_variables() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer ghp_test"))
        .and(body_partial_json(json!({ "variables": { "login": "octocat" } })))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let client = GithubClient::new(Some("ghp_test".to_string()))
        .with_endpoint(format!("{}/graphql", server.uri()));

    let profile = client.fetch_profile("octocat").await.unwrap();

    assert_eq!(profile.display_name(), "The Octocat");
    assert_eq!(profile.followers, 5);
    assert!(profile.contribution_weeks.is_empty());
}

#[tokio::test]
async fn test_client_maps_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = GithubClient::new(Some("ghp_bad".to_string())).with_endpoint(server.uri());

    let result = client.fetch_pinned("octocat").await;

    assert!(matches!(result, Err(GithubError::Unauthorized(401))));
}

#[tokio::test]
async fn test_client_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = GithubClient::new(Some("ghp_test".to_string())).with_endpoint(server.uri());

    let result = client.fetch_profile("octocat").await;

    assert!(matches!(result, Err(GithubError::Status(502))));
}

#[tokio::test]
async fn test_source_refreshes_then_serves_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "first": 6 } })))
        .respond_with(ResponseTemplate::new(200).set_body_string(PINNED_BODY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let client = GithubClient::new(Some("ghp_test".to_string())).with_endpoint(server.uri());
    let source = PortfolioSource::new(
        client,
        CachedFetcher::with_clock(store.clone(), ManualClock::at_millis(0)),
        settings(),
    );

    let pinned = source.pinned_repos().await;
    let profile = source.profile().await;
    assert!(matches!(pinned, FetchOutcome::Refreshed(ref repos) if repos.len() == 1));
    assert!(matches!(profile, FetchOutcome::Refreshed(_)));
    assert_eq!(store.len(), 2);

    // Second round is served from cache; the mocks expect one call each
    let pinned_again = source.pinned_repos().await;
    let profile_again = source.profile().await;
    assert!(matches!(pinned_again, FetchOutcome::Fresh(_)));

    let page = PageState::select(true, profile_again, pinned_again);
    assert!(matches!(page.profile, ProfileSection::GithubCard(ref p) if p.login == "octocat"));
    assert!(matches!(page.projects, ProjectsSection::Repos(ref r) if r[0].name == "hello-world"));
}

#[tokio::test]
async fn test_source_falls_back_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let clock = ManualClock::at_millis(0);
    let client = GithubClient::new(Some("ghp_test".to_string())).with_endpoint(server.uri());
    let source = PortfolioSource::new(
        client,
        CachedFetcher::with_clock(store.clone(), clock.clone()),
        settings(),
    );

    let outcome = source.pinned_repos().await;

    assert_eq!(outcome, FetchOutcome::Unavailable);
    assert!(store.is_empty());
    assert_eq!(PageState::select(true, FetchOutcome::Unavailable, outcome).projects, ProjectsSection::Hidden);
}
