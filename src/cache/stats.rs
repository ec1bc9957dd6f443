//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key absent or value reclaimed)
    pub misses: u64,
    /// Number of put operations, inserts and replacements alike
    pub puts: u64,
    /// Number of entries evicted due to the capacity bound
    pub evictions: u64,
    /// Number of weak/soft entries purged after their value was reclaimed
    pub reclaimed: u64,
    /// Number of eviction listener or stop hook calls that returned an error
    pub listener_failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Hard bound on resident entries
    pub maximum_capacity: usize,
    /// When counting started (creation or last reset)
    pub since: DateTime<Utc>,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            puts: 0,
            evictions: 0,
            reclaimed: 0,
            listener_failures: 0,
            total_entries: 0,
            maximum_capacity: 0,
            since: Utc::now(),
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_put(&mut self) {
        self.puts += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Adds purged reclaimed entries.
    pub fn record_reclaimed(&mut self, count: usize) {
        self.reclaimed += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    // == Reset ==
    /// Zeroes every counter and restarts the `since` clock.
    ///
    /// Entry count and capacity describe current state, so they are kept.
    pub fn reset(&mut self) {
        *self = Self {
            total_entries: self.total_entries,
            maximum_capacity: self.maximum_capacity,
            ..Self::new()
        };
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.puts, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.reclaimed, 0);
        assert_eq!(stats.listener_failures, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_eviction_and_reclaimed() {
        let mut stats = CacheStats::new();
        stats.record_eviction();
        stats.record_eviction();
        stats.record_reclaimed(3);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.reclaimed, 3);
    }

    #[test]
    fn test_reset_keeps_state_fields() {
        let mut stats = CacheStats::new();
        stats.maximum_capacity = 10;
        stats.set_total_entries(4);
        stats.record_hit();
        stats.record_put();
        stats.record_eviction();
        let before = stats.since;

        stats.reset();

        assert_eq!(stats.hits, 0);
        assert_eq!(stats.puts, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.maximum_capacity, 10);
        assert!(stats.since >= before);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert!(json["since"].is_string());
    }
}
