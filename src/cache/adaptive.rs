use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use super::eviction::{select_victims, Candidate};
use super::sweeper::Sweeper;
use crate::router::RouteMatch;
use crate::runtime_config::CacheConfig;

/// Point-in-time cache counters
///
/// `hits`, `misses`, `evictions` and `expirations` are cumulative since the
/// cache was created; `size` is the current entry count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that fell through to the tree
    pub misses: u64,
    /// Live entries
    pub size: usize,
    /// Entries removed to stay within `max_size`
    pub evictions: u64,
    /// Entries removed by the background sweep for being stale
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache (0.0 with no lookups)
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One cached lookup
///
/// `hit_count` and `last_access` are atomics so hits only need the read lock.
/// Latency bookkeeping changes under the write lock in `set`.
pub(crate) struct CacheEntry<V> {
    value: V,
    hit_count: AtomicU64,
    /// Nanoseconds since the cache epoch
    last_access: AtomicU64,
    /// Nanoseconds since the cache epoch
    created_at: u64,
    avg_latency_ns: f64,
    latency_samples: u64,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: u64, latency: Duration) -> Self {
        Self {
            value,
            hit_count: AtomicU64::new(0),
            last_access: AtomicU64::new(now),
            created_at: now,
            avg_latency_ns: latency.as_nanos() as f64,
            latency_samples: 1,
        }
    }

    fn record_latency(&mut self, latency: Duration) {
        self.latency_samples += 1;
        let sample = latency.as_nanos() as f64;
        self.avg_latency_ns += (sample - self.avg_latency_ns) / self.latency_samples as f64;
    }

    fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}

/// State shared between the cache handle and its sweeper thread
pub(crate) struct Shared<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    pub(crate) config: CacheConfig,
    epoch: Instant,
    closed: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    size: AtomicUsize,
}

impl<V> Shared<V> {
    fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop entries idle for longer than `stale_after` and refresh `size`.
    ///
    /// Holds the write lock only for the duration of the sweep.
    pub(crate) fn sweep(&self) -> usize {
        let stale_after = u64::try_from(self.config.stale_after.as_nanos()).unwrap_or(u64::MAX);
        let mut entries = self.write();
        let now = self.now();
        let before = entries.len();
        entries.retain(|_, e| now.saturating_sub(e.last_access()) <= stale_after);
        let removed = before - entries.len();
        self.size.store(entries.len(), Ordering::Relaxed);
        drop(entries);

        if removed > 0 {
            self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        }
        debug!(
            expired = removed,
            size = before - removed,
            hits = self.hits.load(Ordering::Relaxed),
            misses = self.misses.load(Ordering::Relaxed),
            "Route cache sweep"
        );
        removed
    }
}

/// Bounded, concurrency-safe memo of `(method, path)` lookups.
///
/// - `get` takes the read lock and bumps atomic counters, so any number of
///   request threads can hit concurrently.
/// - `set` takes the write lock and, when the cache grows past `max_size`,
///   evicts with a hybrid policy: entries that have not yet earned
///   `min_access_count` hits go first, then the lowest weighted score of
///   frequency, recency and lookup speed. Without `adaptive_mode` eviction is
///   plain LRU.
/// - A background thread sweeps out entries idle for longer than
///   `stale_after` every `cleanup_interval`.
///
/// [`close`](Self::close) stops the sweeper and drops every entry; dropping
/// the cache does the same.
pub struct AdaptiveRouteCache<V = RouteMatch> {
    shared: Arc<Shared<V>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<V> AdaptiveRouteCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache and start its sweeper.
    ///
    /// Unusable configuration values are corrected (see
    /// [`CacheConfig::sanitized`]).
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let config = config.sanitized();
        info!(
            max_size = config.max_size,
            cleanup_interval_ms = u64::try_from(config.cleanup_interval.as_millis()).unwrap_or(u64::MAX),
            min_access_count = config.min_access_count,
            adaptive_mode = config.adaptive_mode,
            "Route cache created"
        );
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::with_capacity(config.max_size.min(4096))),
            config,
            epoch: Instant::now(),
            closed: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            size: AtomicUsize::new(0),
        });
        let sweeper = Sweeper::start(&shared);
        Self {
            shared,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Look up `key`, counting a hit or a miss.
    ///
    /// Returns `None` without counting while the cache is closed.
    pub fn get(&self, key: &str) -> Option<V> {
        let shared = &self.shared;
        if shared.closed.load(Ordering::Acquire) {
            return None;
        }
        let entries = shared.read();
        match entries.get(key) {
            Some(entry) => {
                entry.hit_count.fetch_add(1, Ordering::Relaxed);
                entry.last_access.store(shared.now(), Ordering::Relaxed);
                shared.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                shared.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or update `key` with the lookup latency that produced `value`.
    ///
    /// Ignored while the cache is closed. May evict other entries; never the
    /// one being set.
    pub fn set(&self, key: String, value: V, latency: Duration) {
        let shared = &self.shared;
        if shared.closed.load(Ordering::Acquire) {
            return;
        }
        let mut entries = shared.write();
        // `close` may have cleared the map while this call waited for the lock.
        if shared.closed.load(Ordering::Acquire) {
            return;
        }
        let now = shared.now();
        match entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.value = value;
                entry.record_latency(latency);
                entry.last_access.store(now, Ordering::Relaxed);
            }
            Entry::Vacant(vacant) => {
                let key = vacant.key().clone();
                vacant.insert(CacheEntry::new(value, now, latency));
                let max_size = shared.config.max_size;
                if entries.len() > max_size {
                    let excess = entries.len() - max_size;
                    let victims: Vec<String> = {
                        let candidates = entries
                            .iter()
                            .filter(|(k, _)| **k != key)
                            .map(|(k, e)| Candidate {
                                key: k.as_str(),
                                hit_count: e.hit_count.load(Ordering::Relaxed),
                                last_access: e.last_access(),
                                avg_latency_ns: e.avg_latency_ns,
                            })
                            .collect();
                        select_victims(candidates, excess, &shared.config)
                            .into_iter()
                            .map(str::to_owned)
                            .collect()
                    };
                    for victim in &victims {
                        entries.remove(victim);
                    }
                    shared
                        .evictions
                        .fetch_add(victims.len() as u64, Ordering::Relaxed);
                    debug!(
                        inserted = %key,
                        evicted = victims.len(),
                        victims = ?victims,
                        size = entries.len(),
                        "Route cache eviction"
                    );
                }
            }
        }
        shared.size.store(entries.len(), Ordering::Relaxed);
    }

    /// Remove `key`, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.shared.write();
        let removed = entries.remove(key).is_some();
        self.shared.size.store(entries.len(), Ordering::Relaxed);
        removed
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        let mut entries = self.shared.write();
        entries.clear();
        self.shared.size.store(0, Ordering::Relaxed);
    }

    /// Run one staleness sweep now, returning the number of expired entries
    pub fn sweep(&self) -> usize {
        self.shared.sweep()
    }

    /// Hit count of `key`, if cached
    #[must_use]
    pub fn hit_count(&self, key: &str) -> Option<u64> {
        self.shared
            .read()
            .get(key)
            .map(|e| e.hit_count.load(Ordering::Relaxed))
    }

    /// Mean lookup latency recorded for `key`, if cached
    #[must_use]
    pub fn average_latency(&self, key: &str) -> Option<Duration> {
        self.shared
            .read()
            .get(key)
            .map(|e| Duration::from_nanos(e.avg_latency_ns as u64))
    }

    /// Age of `key` since it was first cached
    #[must_use]
    pub fn age(&self, key: &str) -> Option<Duration> {
        let now = self.shared.now();
        self.shared
            .read()
            .get(key)
            .map(|e| Duration::from_nanos(now.saturating_sub(e.created_at)))
    }

    /// Whether `key` is cached (does not count as an access)
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.shared.read().contains_key(key)
    }

    /// Number of live entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.read().len()
    }

    /// Whether the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let s = &self.shared;
        CacheStats {
            hits: s.hits.load(Ordering::Relaxed),
            misses: s.misses.load(Ordering::Relaxed),
            size: s.size.load(Ordering::Relaxed),
            evictions: s.evictions.load(Ordering::Relaxed),
            expirations: s.expirations.load(Ordering::Relaxed),
        }
    }

    /// Effective (sanitized) configuration
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Whether the cache has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Whether the background sweeper is running
    #[must_use]
    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop the sweeper and drop every entry.
    ///
    /// Idempotent. `get` and `set` are no-ops until [`reopen`](Self::reopen).
    /// In-flight calls are not interrupted.
    pub fn close(&self) {
        let was_open = !self.shared.closed.swap(true, Ordering::AcqRel);
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.stop();
        }
        self.clear();
        if was_open {
            debug!("Route cache closed");
        }
    }

    /// Re-enable a closed cache and restart its sweeper
    pub fn reopen(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        self.shared.closed.store(false, Ordering::Release);
        if sweeper.is_none() {
            *sweeper = Sweeper::start(&self.shared);
        }
        debug!("Route cache reopened");
    }
}

impl<V> Drop for AdaptiveRouteCache<V> {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.stop();
        }
    }
}
