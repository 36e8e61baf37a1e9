//! Cache module for persisting fetched data between runs
//!
//! `CachedFetcher` decides between serving a cached payload, refreshing it, and
//! falling back to a stale copy when the refresh fails. Storage and time are
//! injected (`KeyValueStore`, `Clock`) so the policy can be exercised without a
//! filesystem or a real clock.

mod clock;
mod fetcher;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fetcher::{CacheEntry, CacheKey, CacheKeyError, CachedFetcher, FetchOutcome};
pub use store::{default_cache_dir, FileStore, KeyValueStore, MemoryStore, StoreError};
