//! LRU Core Module
//!
//! Single-threaded cache engine combining HashMap storage with recency
//! ordering. `BoundedCache` puts this behind a lock.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::order::{RecencyOrder, Slot};
use crate::cache::{CacheStats, ValueHolder};
use crate::error::{CacheError, Result};

#[derive(Debug)]
struct Entry<H> {
    holder: H,
    /// Position of the key in the recency order
    slot: Slot,
}

// == Put Outcome ==
/// Result of [`LruCore::put`].
#[derive(Debug)]
pub struct PutOutcome<K, V> {
    /// Value replaced under the same key, if it was still live
    pub previous: Option<Arc<V>>,
    /// Entry evicted to make room, if any
    pub evicted: Option<(K, Arc<V>)>,
}

/// Values taken out of the core under the lock, to be dropped after it is
/// released so a `Drop` impl on `V` never runs inside the critical section.
pub type Detached<V> = Vec<Arc<V>>;

// == LRU Core ==
/// Bounded key-value table with least-recently-used eviction.
///
/// Not thread-safe; see [`BoundedCache`](crate::cache::BoundedCache).
#[derive(Debug)]
pub struct LruCore<K, V, H> {
    /// Key-value storage
    table: HashMap<K, Entry<H>>,
    /// Recency tracker, oldest first
    order: RecencyOrder<K>,
    /// Performance statistics
    stats: CacheStats,
    initial_capacity: usize,
    maximum_capacity: usize,
    /// New-key inserts since the last full reclamation sweep
    inserts_since_sweep: usize,
    _value: PhantomData<fn() -> V>,
}

impl<K, V, H> LruCore<K, V, H>
where
    K: Eq + Hash + Clone,
    H: ValueHolder<V>,
{
    // == Constructor ==
    /// Creates a new core.
    ///
    /// # Arguments
    /// * `initial_capacity` - Sizing hint for the table
    /// * `maximum_capacity` - Hard bound on resident entries, must be positive
    pub fn new(initial_capacity: usize, maximum_capacity: usize) -> Result<Self> {
        if maximum_capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "maximum_capacity must be greater than zero".to_string(),
            ));
        }

        let sized = initial_capacity.min(maximum_capacity);
        let mut stats = CacheStats::new();
        stats.maximum_capacity = maximum_capacity;

        Ok(Self {
            table: HashMap::with_capacity(sized),
            order: RecencyOrder::with_capacity(sized),
            stats,
            initial_capacity,
            maximum_capacity,
            inserts_since_sweep: 0,
            _value: PhantomData,
        })
    }

    // == Get ==
    /// Retrieves a value and promotes its key to most recently used.
    ///
    /// A reclaimed weak/soft value counts as a miss and its entry is purged.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        let (slot, value) = match self.table.get(key) {
            Some(entry) => (entry.slot, entry.holder.value()),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        match value {
            Some(value) => {
                self.order.promote(slot);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.discard(key);
                self.stats.record_reclaimed(1);
                self.stats.record_miss();
                self.stats.set_total_entries(self.table.len());
                None
            }
        }
    }

    // == Peek ==
    /// Retrieves a value without touching recency or statistics.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.table.get(key).and_then(|entry| entry.holder.value())
    }

    // == Contains Key ==
    /// Membership test; does not alter the recency order.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table
            .get(key)
            .map(|entry| entry.holder.is_live())
            .unwrap_or(false)
    }

    // == Put ==
    /// Inserts or replaces a value.
    ///
    /// Replacing promotes the key and never evicts. Inserting a new key at
    /// capacity drops entries from the oldest end until there is room:
    /// reclaimed entries go silently, the first live one is evicted.
    ///
    /// Weak/soft caches also run a full reclamation sweep at capacity, at
    /// most once per `maximum_capacity` inserts.
    pub fn put(&mut self, key: K, value: Arc<V>) -> PutOutcome<K, V> {
        self.stats.record_put();

        if let Some(entry) = self.table.get_mut(&key) {
            let previous = std::mem::replace(&mut entry.holder, H::hold(value)).value();
            let slot = entry.slot;
            self.order.promote(slot);
            return PutOutcome {
                previous,
                evicted: None,
            };
        }

        let mut evicted = None;
        if self.table.len() >= self.maximum_capacity {
            if H::RECLAIMABLE && self.inserts_since_sweep >= self.maximum_capacity {
                self.purge_reclaimed();
            }
            evicted = self.make_room();
        }
        if H::RECLAIMABLE {
            self.inserts_since_sweep += 1;
        }

        let slot = self.order.push_newest(key.clone());
        self.table.insert(
            key,
            Entry {
                holder: H::hold(value),
                slot,
            },
        );
        self.stats.set_total_entries(self.table.len());

        PutOutcome {
            previous: None,
            evicted,
        }
    }

    // == Remove ==
    /// Removes an entry by key.
    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let holder = self.discard(key)?;
        self.stats.set_total_entries(self.table.len());
        holder.value()
    }

    // == Clear ==
    /// Removes every entry and hands back the holders for dropping.
    pub fn clear(&mut self) -> Vec<H> {
        let holders = self.table.drain().map(|(_, entry)| entry.holder).collect();
        self.order.clear();
        self.inserts_since_sweep = 0;
        self.stats.set_total_entries(0);
        holders
    }

    // == Purge Reclaimed ==
    /// Removes entries whose value has been reclaimed.
    ///
    /// Returns the number of entries removed. Always 0 for strong values.
    pub fn purge_reclaimed(&mut self) -> usize {
        if !H::RECLAIMABLE {
            return 0;
        }

        let dead: Vec<K> = self
            .table
            .iter()
            .filter(|(_, entry)| !entry.holder.is_live())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &dead {
            self.discard(key);
        }

        self.inserts_since_sweep = 0;
        self.stats.record_reclaimed(dead.len());
        self.stats.set_total_entries(self.table.len());
        dead.len()
    }

    // == Release Soft Values ==
    /// Detaches soft pins and purges every entry that is unreachable once
    /// they are dropped.
    ///
    /// Returns the purged count and the detached pins.
    pub fn release_soft_values(&mut self) -> (usize, Detached<V>) {
        if !H::RECLAIMABLE {
            return (0, Vec::new());
        }

        let mut detached = Vec::new();
        let mut dead = Vec::new();
        for (key, entry) in self.table.iter_mut() {
            match entry.holder.release() {
                // the pin is the last owner
                Some(pin) if Arc::strong_count(&pin) == 1 => {
                    dead.push(key.clone());
                    detached.push(pin);
                }
                Some(pin) => detached.push(pin),
                None if !entry.holder.is_live() => dead.push(key.clone()),
                None => {}
            }
        }

        for key in &dead {
            self.discard(key);
        }

        self.inserts_since_sweep = 0;
        self.stats.record_reclaimed(dead.len());
        self.stats.set_total_entries(self.table.len());
        (dead.len(), detached)
    }

    // == Contains Value ==
    /// Linear search for a value.
    ///
    /// Unsupported for weak/soft values: a value can be reclaimed while the
    /// search runs, so no answer would be reliable.
    pub fn contains_value(&self, value: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        if H::RECLAIMABLE {
            return Err(CacheError::Unsupported(format!(
                "contains_value is not supported for {} values",
                H::STRENGTH
            )));
        }
        Ok(self
            .table
            .values()
            .any(|entry| entry.holder.value().map_or(false, |v| *v == *value)))
    }

    // == Snapshots ==
    /// Live keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        self.order
            .iter()
            .filter(|(_, key)| self.contains_key(key))
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Live values from least to most recently used.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.order
            .iter()
            .filter_map(|(_, key)| self.peek(key))
            .collect()
    }

    /// Live entries from least to most recently used.
    pub fn entries(&self) -> Vec<(K, Arc<V>)> {
        self.order
            .iter()
            .filter_map(|(_, key)| self.peek(key).map(|value| (key.clone(), value)))
            .collect()
    }

    // == Length ==
    /// Returns the number of entries, including reclaimed ones not yet purged.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Number of entries whose value is still reachable.
    pub fn live_len(&self) -> usize {
        if H::RECLAIMABLE {
            self.table.values().filter(|entry| entry.holder.is_live()).count()
        } else {
            self.table.len()
        }
    }

    pub fn has_live(&self) -> bool {
        if H::RECLAIMABLE {
            self.table.values().any(|entry| entry.holder.is_live())
        } else {
            !self.table.is_empty()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn maximum_capacity(&self) -> usize {
        self.maximum_capacity
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.table.len());
        stats
    }

    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    // == Consistency ==
    /// Checks that the table and recency order describe the same key set.
    ///
    /// Every table key appears exactly once in the order at its recorded
    /// slot, and the order holds nothing else.
    pub fn is_consistent(&self) -> bool {
        if self.table.len() != self.order.len() || self.table.len() > self.maximum_capacity {
            return false;
        }

        let mut seen = HashSet::with_capacity(self.table.len());
        for (slot, key) in self.order.iter() {
            if !seen.insert(key) {
                return false;
            }
            match self.table.get(key) {
                Some(entry) if entry.slot == slot => {}
                _ => return false,
            }
        }
        seen.len() == self.table.len()
    }

    /// Pops from the oldest end until a slot is free. Returns the live
    /// entry evicted, if one had to go.
    fn make_room(&mut self) -> Option<(K, Arc<V>)> {
        while self.table.len() >= self.maximum_capacity {
            let key = self.order.pop_oldest()?;
            let Some(entry) = self.table.remove(&key) else {
                continue;
            };

            match entry.holder.value() {
                Some(value) => {
                    self.stats.record_eviction();
                    return Some((key, value));
                }
                // reclaimed; nothing to notify
                None => self.stats.record_reclaimed(1),
            }
        }
        None
    }

    fn discard(&mut self, key: &K) -> Option<H> {
        let entry = self.table.remove(key)?;
        self.order.unlink(entry.slot);
        Some(entry.holder)
    }
}
