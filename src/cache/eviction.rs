//! Victim selection for the adaptive cache.
//!
//! Selection works on plain snapshots of the entries so it can be tested and
//! reasoned about without locks or clocks.

use crate::runtime_config::CacheConfig;

/// Snapshot of one entry's eviction inputs
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'a> {
    pub key: &'a str,
    pub hit_count: u64,
    /// Nanoseconds since the cache epoch; larger is more recent
    pub last_access: u64,
    /// Mean lookup latency in nanoseconds
    pub avg_latency_ns: f64,
}

/// Pick `excess` keys to evict.
///
/// The caller excludes the key whose insertion triggered the pass. In adaptive
/// mode, entries below `min_access_count` hits go first (oldest access first),
/// then the remaining entries with the lowest weighted score. Outside adaptive
/// mode, or when every weight is zero, the remainder is plain LRU.
pub(crate) fn select_victims<'a>(
    mut candidates: Vec<Candidate<'a>>,
    excess: usize,
    config: &CacheConfig,
) -> Vec<&'a str> {
    let mut victims = Vec::with_capacity(excess);
    if excess == 0 || candidates.is_empty() {
        return victims;
    }

    if config.adaptive_mode {
        let (mut unproven, proven): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.hit_count < config.min_access_count);
        unproven.sort_by_key(|c| c.last_access);
        victims.extend(unproven.iter().take(excess).map(|c| c.key));
        candidates = proven;
    }

    let remaining = excess - victims.len();
    if remaining == 0 || candidates.is_empty() {
        return victims;
    }

    if !config.adaptive_mode || config.weights_are_zero() {
        candidates.sort_by_key(|c| c.last_access);
        victims.extend(candidates.iter().take(remaining).map(|c| c.key));
        return victims;
    }

    let scorer = Scorer::new(&candidates);
    let mut scored: Vec<(f64, &Candidate<'a>)> = candidates
        .iter()
        .map(|c| (scorer.score(c, config), c))
        .collect();
    // Lowest score first; ties go to the least recently used.
    scored.sort_by(|(sa, a), (sb, b)| {
        sa.total_cmp(sb)
            .then_with(|| a.last_access.cmp(&b.last_access))
    });
    victims.extend(scored.iter().take(remaining).map(|(_, c)| c.key));
    victims
}

/// Per-component ranges over one eviction pass
struct Scorer {
    hits: Range,
    recency: Range,
    speed: Range,
}

impl Scorer {
    fn new(peers: &[Candidate<'_>]) -> Self {
        Self {
            hits: Range::of(peers.iter().map(|c| c.hit_count as f64)),
            recency: Range::of(peers.iter().map(|c| c.last_access as f64)),
            speed: Range::of(peers.iter().map(|c| inverse_latency(c.avg_latency_ns))),
        }
    }

    /// `Wf·norm(hits) + Wa·norm(recency) + Wr·norm(1/latency)`
    fn score(&self, c: &Candidate<'_>, config: &CacheConfig) -> f64 {
        config.frequency_weight * self.hits.normalize(c.hit_count as f64)
            + config.access_time_weight * self.recency.normalize(c.last_access as f64)
            + config.response_time_weight * self.speed.normalize(inverse_latency(c.avg_latency_ns))
    }
}

fn inverse_latency(avg_latency_ns: f64) -> f64 {
    1.0 / avg_latency_ns.max(1.0)
}

/// Min-max range used to normalise one score component into [0, 1]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Range {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |r, v| Range {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        )
    }

    /// All-equal inputs normalise to 1.0
    fn normalize(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            1.0
        } else {
            (v - self.min) / span
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(key: &str, hit_count: u64, last_access: u64, avg_latency_ns: f64) -> Candidate<'_> {
        Candidate {
            key,
            hit_count,
            last_access,
            avg_latency_ns,
        }
    }

    #[test]
    fn test_unproven_entries_go_first() {
        let config = CacheConfig::default();
        let candidates = vec![
            c("hot", 50, 10, 1000.0),
            c("warm", 5, 20, 1000.0),
            c("new", 0, 30, 1000.0),
        ];
        assert_eq!(select_victims(candidates, 1, &config), vec!["new"]);
    }

    #[test]
    fn test_unproven_oldest_first() {
        let config = CacheConfig::default();
        let candidates = vec![c("b", 1, 20, 1.0), c("a", 0, 10, 1.0), c("c", 9, 5, 1.0)];
        assert_eq!(select_victims(candidates, 2, &config), vec!["a", "b"]);
    }

    #[test]
    fn test_lowest_score_evicted_among_proven() {
        let config = CacheConfig::default();
        let candidates = vec![
            c("hot_recent", 100, 100, 500.0),
            c("cold_old", 3, 1, 500.0),
            c("mid", 40, 50, 500.0),
        ];
        assert_eq!(select_victims(candidates, 1, &config), vec!["cold_old"]);
    }

    #[test]
    fn test_slow_lookups_score_lower() {
        let config = CacheConfig {
            access_time_weight: 0.0,
            frequency_weight: 0.0,
            response_time_weight: 1.0,
            ..CacheConfig::default()
        };
        let candidates = vec![c("fast", 10, 1, 100.0), c("slow", 10, 2, 10_000.0)];
        assert_eq!(select_victims(candidates, 1, &config), vec!["slow"]);
    }

    #[test]
    fn test_non_adaptive_is_lru() {
        let config = CacheConfig {
            adaptive_mode: false,
            ..CacheConfig::default()
        };
        let candidates = vec![c("hot_old", 1000, 1, 1.0), c("cold_new", 0, 99, 1.0)];
        assert_eq!(select_victims(candidates, 1, &config), vec!["hot_old"]);
    }

    #[test]
    fn test_zero_weights_fall_back_to_lru() {
        let config = CacheConfig {
            access_time_weight: 0.0,
            frequency_weight: 0.0,
            response_time_weight: 0.0,
            ..CacheConfig::default()
        };
        let candidates = vec![c("older", 10, 1, 1.0), c("newer", 10, 2, 1.0)];
        assert_eq!(select_victims(candidates, 1, &config), vec!["older"]);
    }

    #[test]
    fn test_equal_inputs_normalise_to_one() {
        let config = CacheConfig::default();
        let peers = vec![c("a", 5, 7, 10.0), c("b", 5, 7, 10.0)];
        let s = Scorer::new(&peers).score(&peers[0], &config);
        assert!((s - 1.0).abs() < 1e-9);
    }
}
