//! Cached remote fetch with stale-on-error fallback
//!
//! `CachedFetcher::resolve` serves a cached payload while it is younger than the
//! TTL, refreshes it through a caller-supplied fetch function otherwise, and on
//! any fetch failure falls back to whatever entry exists (fresh or stale) before
//! giving up with `FetchOutcome::Unavailable`. Failures never escape: fetch,
//! storage and decode errors are logged and folded into the outcome.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::store::KeyValueStore;

/// Persisted record for one cache key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// When the entry was written
    pub timestamp: DateTime<Utc>,
    /// Last successfully fetched value
    pub payload: T,
}

/// Error building a cache key
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheKeyError {
    #[error("Cache key must not be empty")]
    Empty,
}

/// Identity of one logical cached resource
///
/// Keys built with [`CacheKey::versioned`] embed a schema version, so changing
/// the shape of an upstream query means bumping the version and leaving old
/// payloads behind under their previous key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Result<Self, CacheKeyError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CacheKeyError::Empty);
        }
        Ok(Self(key))
    }

    /// Builds `<namespace>:v<version>:<identity>`
    pub fn versioned(namespace: &str, version: u32, identity: &str) -> Result<Self, CacheKeyError> {
        if namespace.trim().is_empty() || identity.trim().is_empty() {
            return Err(CacheKeyError::Empty);
        }
        Ok(Self(format!("{}:v{}:{}", namespace, version, identity)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one resolve call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// Served from a cache entry younger than the TTL
    Fresh(T),
    /// Fetched just now and written to the cache
    Refreshed(T),
    /// Fetch failed (or was not possible); an older entry was served
    StaleFallback(T),
    /// Fetch failed and nothing was cached
    Unavailable,
}

impl<T> FetchOutcome<T> {
    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Fresh(p) | Self::Refreshed(p) | Self::StaleFallback(p) => Some(p),
            Self::Unavailable => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            Self::Fresh(p) | Self::Refreshed(p) | Self::StaleFallback(p) => Some(p),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleFallback(_))
    }

    /// Transforms the payload while keeping the outcome kind
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Fresh(p) => FetchOutcome::Fresh(f(p)),
            Self::Refreshed(p) => FetchOutcome::Refreshed(f(p)),
            Self::StaleFallback(p) => FetchOutcome::StaleFallback(f(p)),
            Self::Unavailable => FetchOutcome::Unavailable,
        }
    }
}

/// Cache-first fetcher over an injected store and clock
///
/// Performs no locking or de-duplication: concurrent resolves of the same key
/// each fetch, and the last write wins.
#[derive(Debug, Clone)]
pub struct CachedFetcher<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> CachedFetcher<S, SystemClock> {
    /// Creates a fetcher that judges freshness against wall-clock time
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> CachedFetcher<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves `key`, fetching only when the cached entry is missing or older than `ttl`
    pub async fn resolve<T, E, F, Fut>(&self, key: &CacheKey, ttl: Duration, fetch: F) -> FetchOutcome<T>
    where
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.resolve_gated(key, ttl, true, fetch).await
    }

    /// Like [`resolve`](Self::resolve), but when `capable` is false the fetch is
    /// treated as failed without being invoked
    ///
    /// A fresh entry is still served; otherwise any entry is served as a stale
    /// fallback, and `Unavailable` is returned if there is none.
    pub async fn resolve_gated<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        capable: bool,
        fetch: F,
    ) -> FetchOutcome<T>
    where
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(entry) = self.read_entry::<T>(key) {
            if self.is_fresh(entry.timestamp, ttl) {
                debug!(key = %key, cached_at = %entry.timestamp, "cache hit");
                return FetchOutcome::Fresh(entry.payload);
            }
            debug!(key = %key, cached_at = %entry.timestamp, "cache entry expired");
        }

        if !capable {
            warn!(key = %key, "fetch skipped: no capability to fetch, using cache if available");
            return self.fallback(key);
        }

        match fetch().await {
            Ok(payload) => {
                self.write_entry(key, &payload);
                FetchOutcome::Refreshed(payload)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "fetch failed, falling back to cache");
                self.fallback(key)
            }
        }
    }

    /// Serves any cached entry regardless of age
    pub fn fallback<T: DeserializeOwned>(&self, key: &CacheKey) -> FetchOutcome<T> {
        match self.read_entry::<T>(key) {
            Some(entry) => FetchOutcome::StaleFallback(entry.payload),
            None => FetchOutcome::Unavailable,
        }
    }

    /// Reads the entry for `key`; unreadable or malformed entries count as absent
    pub fn read_entry<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        let bytes = match self.store.get(key.as_str()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, error = %e, "cache entry malformed, treating as absent");
                None
            }
        }
    }

    fn write_entry<T: Serialize>(&self, key: &CacheKey, payload: &T) {
        let entry = CacheEntry {
            timestamp: self.clock.now(),
            payload,
        };

        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "cache entry not serialisable, skipping write");
                return;
            }
        };

        if let Err(e) = self.store.set(key.as_str(), &bytes) {
            warn!(key = %key, error = %e, "cache write failed");
        }
    }

    fn is_fresh(&self, timestamp: DateTime<Utc>, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }
        // Too large to represent: never expires
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return true;
        };
        self.clock.now().signed_duration_since(timestamp) < ttl
    }
}
