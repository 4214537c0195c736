//! # Runtime Configuration Module
//!
//! Environment- and file-based configuration for the router and its adaptive
//! lookup cache.
//!
//! ## Environment Variables
//!
//! | Variable                                 | Default | Meaning                                  |
//! |------------------------------------------|---------|------------------------------------------|
//! | `ROUTETRIE_CACHE`                        | `on`    | `off` starts the router without a cache  |
//! | `ROUTETRIE_CACHE_MAX_SIZE`               | `1000`  | Maximum cached lookups                   |
//! | `ROUTETRIE_CACHE_CLEANUP_INTERVAL_MS`    | `60000` | Period of the background sweep           |
//! | `ROUTETRIE_CACHE_MIN_ACCESS_COUNT`       | `2`     | Hits an entry needs to be "proven"       |
//! | `ROUTETRIE_CACHE_ACCESS_TIME_WEIGHT`     | `0.4`   | Weight of recency in the eviction score  |
//! | `ROUTETRIE_CACHE_FREQUENCY_WEIGHT`       | `0.4`   | Weight of hit count                      |
//! | `ROUTETRIE_CACHE_RESPONSE_TIME_WEIGHT`   | `0.2`   | Weight of (inverse) lookup latency       |
//! | `ROUTETRIE_CACHE_ADAPTIVE`               | `true`  | `false` degrades eviction to plain LRU   |
//! | `ROUTETRIE_CACHE_STALE_AFTER_MS`         | `300000`| Idle time after which the sweep drops an entry |
//! | `ROUTETRIE_SLOW_MATCH_THRESHOLD_US`      | `1000`  | Lookups slower than this log a WARN      |
//!
//! Unparsable or out-of-range values never fail startup: they are replaced by
//! the default and reported with a WARN.
//!
//! ## Route table files
//!
//! The CLI reads routes from TOML:
//!
//! ```toml
//! [cache]
//! max_size = 500
//! cleanup_interval_ms = 30000
//!
//! [[routes]]
//! method = "GET"
//! pattern = "/user/:id"
//! handler = "get_user"
//! middleware = ["metrics"]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use routetrie::runtime_config::RouterConfig;
//!
//! let config = RouterConfig::from_env();
//! println!("Cache size: {}", config.cache.max_size);
//! ```

use anyhow::{Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default maximum number of cached lookups
pub const DEFAULT_MAX_SIZE: usize = 1000;
/// Default period of the background sweep
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
/// Default idle time after which the sweep drops an entry
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);
/// Default threshold for the slow-lookup WARN
pub const DEFAULT_SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// Adaptive cache configuration
///
/// Durations are written in milliseconds in TOML (`cleanup_interval_ms`,
/// `stale_after_ms`). Call [`CacheConfig::sanitized`] before use; the cache
/// does so itself on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries (default: 1000)
    pub max_size: usize,
    /// Period of the background sweep (default: 60s)
    #[serde(rename = "cleanup_interval_ms", with = "duration_ms")]
    pub cleanup_interval: Duration,
    /// Entries with fewer hits are evicted before any scoring (default: 2)
    pub min_access_count: u64,
    /// Weight of recency in the eviction score (default: 0.4)
    pub access_time_weight: f64,
    /// Weight of hit count in the eviction score (default: 0.4)
    pub frequency_weight: f64,
    /// Weight of inverse lookup latency in the eviction score (default: 0.2)
    pub response_time_weight: f64,
    /// Weighted eviction when true, plain LRU when false (default: true)
    pub adaptive_mode: bool,
    /// Idle time after which the sweep drops an entry (default: 5 min)
    #[serde(rename = "stale_after_ms", with = "duration_ms")]
    pub stale_after: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            min_access_count: 2,
            access_time_weight: 0.4,
            frequency_weight: 0.4,
            response_time_weight: 0.2,
            adaptive_mode: true,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

impl CacheConfig {
    /// Load cache configuration from `ROUTETRIE_CACHE_*` variables
    #[must_use]
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_size: env_or("ROUTETRIE_CACHE_MAX_SIZE", d.max_size),
            cleanup_interval: Duration::from_millis(env_or(
                "ROUTETRIE_CACHE_CLEANUP_INTERVAL_MS",
                millis(d.cleanup_interval),
            )),
            min_access_count: env_or("ROUTETRIE_CACHE_MIN_ACCESS_COUNT", d.min_access_count),
            access_time_weight: env_or("ROUTETRIE_CACHE_ACCESS_TIME_WEIGHT", d.access_time_weight),
            frequency_weight: env_or("ROUTETRIE_CACHE_FREQUENCY_WEIGHT", d.frequency_weight),
            response_time_weight: env_or(
                "ROUTETRIE_CACHE_RESPONSE_TIME_WEIGHT",
                d.response_time_weight,
            ),
            adaptive_mode: env_flag("ROUTETRIE_CACHE_ADAPTIVE", d.adaptive_mode),
            stale_after: Duration::from_millis(env_or(
                "ROUTETRIE_CACHE_STALE_AFTER_MS",
                millis(d.stale_after),
            )),
        }
        .sanitized()
    }

    /// Replace unusable values with defaults.
    ///
    /// Zero size or zero intervals fall back to their defaults; negative or
    /// non-finite weights become 0. Each correction is logged at WARN.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.max_size == 0 {
            warn!(field = "max_size", default = d.max_size, "Invalid cache size, using default");
            self.max_size = d.max_size;
        }
        if self.cleanup_interval.is_zero() {
            warn!(
                field = "cleanup_interval",
                default_ms = millis(d.cleanup_interval),
                "Invalid cache cleanup interval, using default"
            );
            self.cleanup_interval = d.cleanup_interval;
        }
        if self.stale_after.is_zero() {
            warn!(
                field = "stale_after",
                default_ms = millis(d.stale_after),
                "Invalid cache staleness bound, using default"
            );
            self.stale_after = d.stale_after;
        }
        for (field, weight) in [
            ("access_time_weight", &mut self.access_time_weight),
            ("frequency_weight", &mut self.frequency_weight),
            ("response_time_weight", &mut self.response_time_weight),
        ] {
            if !weight.is_finite() || *weight < 0.0 {
                warn!(field, value = *weight, "Invalid cache weight, using 0");
                *weight = 0.0;
            }
        }
        self
    }

    /// Whether every eviction weight is zero
    #[must_use]
    pub fn weights_are_zero(&self) -> bool {
        self.access_time_weight == 0.0
            && self.frequency_weight == 0.0
            && self.response_time_weight == 0.0
    }
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Start with the lookup cache enabled (default: true)
    pub cache_enabled: bool,
    /// Cache settings used whenever the cache is (re)enabled
    pub cache: CacheConfig,
    /// Lookups slower than this are logged at WARN (default: 1ms)
    #[serde(rename = "slow_match_threshold_us", with = "duration_us")]
    pub slow_match_threshold: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache: CacheConfig::default(),
            slow_match_threshold: DEFAULT_SLOW_MATCH_THRESHOLD,
        }
    }
}

impl RouterConfig {
    /// Load router configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let slow_us = u64::try_from(DEFAULT_SLOW_MATCH_THRESHOLD.as_micros()).unwrap_or(1000);
        Self {
            cache_enabled: env_flag("ROUTETRIE_CACHE", true),
            cache: CacheConfig::from_env(),
            slow_match_threshold: Duration::from_micros(env_or(
                "ROUTETRIE_SLOW_MATCH_THRESHOLD_US",
                slow_us,
            )),
        }
    }
}

/// One `[[routes]]` entry of a route table file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// HTTP method, case-sensitive (`GET`, `POST`, ...)
    pub method: String,
    /// Route pattern, e.g. `/user/:id`
    pub pattern: String,
    /// Handler name reported on match
    pub handler: String,
    /// Built-in middleware names, outermost first
    #[serde(default)]
    pub middleware: Vec<String>,
}

impl RouteEntry {
    /// Parse the entry's method
    pub fn method(&self) -> Result<Method> {
        Method::from_bytes(self.method.as_bytes())
            .with_context(|| format!("invalid HTTP method '{}' for route '{}'", self.method, self.pattern))
    }
}

/// Route table file: optional cache settings plus the routes to register
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    /// Overrides the environment cache configuration when present
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    /// Routes in registration order
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouteTable {
    /// Parse a route table from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse route table")
    }

    /// Router configuration: environment settings with the file's `[cache]`
    /// table taking precedence
    #[must_use]
    pub fn router_config(&self) -> RouterConfig {
        let mut config = RouterConfig::from_env();
        if let Some(cache) = &self.cache {
            config.cache = cache.clone().sanitized();
        }
        config
    }
}

/// Load a route table from a TOML file
pub fn load_route_table(path: &Path) -> Result<RouteTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route table {}", path.display()))?;
    RouteTable::from_toml_str(&contents)
        .with_context(|| format!("invalid route table {}", path.display()))
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = name, value = %raw, default = %default, "Unparsable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => true,
            "0" | "false" | "off" | "no" => false,
            _ => {
                warn!(variable = name, value = %raw, default, "Unparsable flag, using default");
                default
            }
        },
        Err(_) => default,
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(super::millis(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod duration_us {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_micros)
    }
}
