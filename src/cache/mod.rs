//! # Adaptive Route Cache
//!
//! Memoizes `(method, path)` lookups so hot routes skip the tree walk.
//!
//! ## Eviction
//!
//! When an insert pushes the cache past `max_size`:
//!
//! 1. Entries with fewer than `min_access_count` hits are evicted first,
//!    least recently used first. They have not proven their value yet.
//! 2. If still over capacity, each remaining entry is scored
//!
//!    ```text
//!    score = Wf·norm(hit_count) + Wa·norm(recency) + Wr·norm(1/avg_latency)
//!    ```
//!
//!    with min-max normalisation over the entries being considered, and the
//!    lowest scores are evicted.
//! 3. Without `adaptive_mode` (or with all weights at zero) eviction is plain LRU.
//!
//! The entry whose insertion triggered the pass is never evicted by it.
//!
//! ## Background cleanup
//!
//! A `route-cache-sweeper` thread wakes every `cleanup_interval`, drops entries
//! idle for longer than `stale_after` and refreshes the size counter. It takes
//! the write lock only while sweeping.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use routetrie::cache::AdaptiveRouteCache;
//! use routetrie::runtime_config::CacheConfig;
//!
//! let cache: AdaptiveRouteCache<&'static str> = AdaptiveRouteCache::new(CacheConfig::default());
//! assert!(cache.get("GET /health").is_none());
//! cache.set("GET /health".to_string(), "health", Duration::from_micros(2));
//! assert_eq!(cache.get("GET /health"), Some("health"));
//!
//! let stats = cache.stats();
//! assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
//! cache.close();
//! ```

mod adaptive;
mod eviction;
mod sweeper;

pub use adaptive::{AdaptiveRouteCache, CacheStats};
