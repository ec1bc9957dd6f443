//! Bounded Cache Module
//!
//! Thread-safe cache built from [`LruCore`] behind a `parking_lot::RwLock`.
//!
//! Every operation runs in one critical section, so the table and recency
//! order always change together and operations are linearizable. Victim
//! selection, removal and insertion happen under the same write lock;
//! the eviction listener runs afterwards on the calling thread.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::listener::{Notifier, StopHook};
use crate::cache::{
    CacheOptions, CacheStats, EvictionListener, LruCore, SoftValue, StrongValue, ValueHolder,
    ValueStrength, WeakValue,
};
use crate::error::{CacheError, Result};

// == Cache Trait ==
/// Object-safe view of a bounded cache, as handed out by factories.
pub trait Cache<K, V>: Send + Sync {
    /// Returns the value and promotes the key.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Inserts or replaces, returning the previous live value.
    fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>>;

    fn put_all(&self, entries: Vec<(K, Arc<V>)>);

    /// Removes without notifying the eviction listener.
    fn remove(&self, key: &K) -> Option<Arc<V>>;

    /// Membership test that leaves the recency order untouched.
    fn contains_key(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry without notifying the eviction listener.
    fn clear(&self);

    fn keys(&self) -> Vec<K>;

    fn values(&self) -> Vec<Arc<V>>;

    fn entries(&self) -> Vec<(K, Arc<V>)>;

    fn stats(&self) -> CacheStats;

    fn reset_statistics(&self);

    fn maximum_capacity(&self) -> usize;

    fn strength(&self) -> ValueStrength;

    fn purge_reclaimed(&self) -> usize;

    fn release_soft_values(&self) -> usize;

    fn is_consistent(&self) -> bool;
}

// == Bounded Cache ==
/// Thread-safe bounded LRU cache.
///
/// `H` selects how values are held: [`StrongValue`] (default),
/// [`WeakValue`] or [`SoftValue`].
///
/// Weak and soft caches support `get`, `put`, `put_all`, `remove`,
/// `contains_key`, `len`, `is_empty`, the snapshot views and `clear`.
/// [`contains_value`](Self::contains_value) returns
/// [`CacheError::Unsupported`] for them.
pub struct BoundedCache<K, V, H = StrongValue<V>> {
    inner: RwLock<LruCore<K, V, H>>,
    notifier: Notifier<K, V>,
}

/// Cache whose values live only while held elsewhere.
pub type WeakCache<K, V> = BoundedCache<K, V, WeakValue<V>>;

/// Cache whose values are pinned until memory pressure is signalled.
pub type SoftCache<K, V> = BoundedCache<K, V, SoftValue<V>>;

impl<K, V, H> BoundedCache<K, V, H>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: ValueHolder<V>,
{
    // == Constructors ==
    /// Creates a cache without listener.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `maximum_capacity` is 0.
    pub fn new(initial_capacity: usize, maximum_capacity: usize) -> Result<Self> {
        Self::build(initial_capacity, maximum_capacity, None, None)
    }

    /// Creates a cache from a builder.
    ///
    /// The builder's strength must match `H`.
    pub fn with_options(options: CacheOptions<K, V>) -> Result<Self> {
        if options.strength != H::STRENGTH {
            return Err(CacheError::InvalidArgument(format!(
                "options request {} values but this cache holds {} values",
                options.strength,
                H::STRENGTH
            )));
        }
        Self::build(
            options.initial_capacity,
            options.maximum_capacity,
            options.listener,
            options.stop_hook,
        )
    }

    fn build(
        initial_capacity: usize,
        maximum_capacity: usize,
        listener: Option<Arc<dyn EvictionListener<K, V>>>,
        stop_hook: Option<StopHook<V>>,
    ) -> Result<Self> {
        let core = LruCore::new(initial_capacity, maximum_capacity)?;
        let notifier = Notifier::new(listener, stop_hook);
        let strength = H::STRENGTH;

        debug!(
            initial_capacity,
            maximum_capacity,
            strength = %strength,
            listener = notifier.is_active(),
            "Created bounded cache"
        );

        Ok(Self {
            inner: RwLock::new(core),
            notifier,
        })
    }

    // == Get ==
    /// Retrieves a value and promotes its key to most recently used.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.write().get(key)
    }

    /// Retrieves a value without promoting it or counting a hit/miss.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner.read().peek(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    // == Put ==
    /// Inserts or replaces a value, evicting the least recently used entry
    /// when a new key would exceed the bound.
    ///
    /// The eviction listener runs after the lock is released. Listener
    /// errors are logged and counted; a listener panic propagates here.
    pub fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        let outcome = self.inner.write().put(key, value);

        if let Some((key, value)) = outcome.evicted {
            trace!("Evicted least recently used entry");
            self.notifier.notify(&key, &value);
        }

        outcome.previous
    }

    /// Wraps `value` in an `Arc` and puts it.
    ///
    /// On a weak cache the new `Arc` has no other owner, so the entry is
    /// reclaimable immediately; use [`put`](Self::put) and keep a clone.
    pub fn insert(&self, key: K, value: V) -> Option<Arc<V>> {
        self.put(key, Arc::new(value))
    }

    /// Puts each pair in iteration order.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Arc<V>)>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    // == Remove ==
    /// Removes an entry by key. The eviction listener is not called.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.inner.write().remove(key)
    }

    // == Clear ==
    /// Removes every entry. The eviction listener is not called.
    ///
    /// Values are dropped after the lock is released.
    pub fn clear(&self) {
        let removed = self.inner.write().clear();
        debug!(removed = removed.len(), "Cleared bounded cache");
        drop(removed);
    }

    // == Length ==
    /// Number of live entries. Reclaimed entries awaiting a sweep are not counted.
    pub fn len(&self) -> usize {
        self.inner.read().live_len()
    }

    pub fn is_empty(&self) -> bool {
        !self.inner.read().has_live()
    }

    // == Snapshots ==
    /// Live keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().keys()
    }

    /// Live values from least to most recently used.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.inner.read().values()
    }

    /// Live entries from least to most recently used.
    pub fn entries(&self) -> Vec<(K, Arc<V>)> {
        self.inner.read().entries()
    }

    /// Linear value search. Unsupported on weak/soft caches.
    pub fn contains_value(&self, value: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        self.inner.read().contains_value(value)
    }

    // == Maintenance ==
    /// Purges entries whose weak/soft value was reclaimed.
    pub fn purge_reclaimed(&self) -> usize {
        let purged = self.inner.write().purge_reclaimed();
        if purged > 0 {
            debug!(purged, "Purged reclaimed cache entries");
        }
        purged
    }

    /// Signals memory pressure: soft values lose their pin and anything no
    /// longer reachable is purged. Returns the number of purged entries.
    pub fn release_soft_values(&self) -> usize {
        let (purged, detached) = self.inner.write().release_soft_values();
        drop(detached);
        let strength = H::STRENGTH;
        debug!(purged, strength = %strength, "Released soft cache values");
        purged
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.inner.read().stats();
        stats.listener_failures = self.notifier.failures();
        stats
    }

    pub fn reset_statistics(&self) {
        self.inner.write().reset_statistics();
        self.notifier.reset();
        debug!("Reset cache statistics");
    }

    // == Accessors ==
    pub fn initial_capacity(&self) -> usize {
        self.inner.read().initial_capacity()
    }

    pub fn maximum_capacity(&self) -> usize {
        self.inner.read().maximum_capacity()
    }

    pub fn strength(&self) -> ValueStrength {
        H::STRENGTH
    }

    /// Checks that table and recency order agree. Diagnostic only.
    pub fn is_consistent(&self) -> bool {
        self.inner.read().is_consistent()
    }

}

impl<K, V, H> Cache<K, V> for BoundedCache<K, V, H>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: ValueHolder<V>,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        BoundedCache::get(self, key)
    }

    fn put(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        BoundedCache::put(self, key, value)
    }

    fn put_all(&self, entries: Vec<(K, Arc<V>)>) {
        BoundedCache::put_all(self, entries)
    }

    fn remove(&self, key: &K) -> Option<Arc<V>> {
        BoundedCache::remove(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        BoundedCache::contains_key(self, key)
    }

    fn len(&self) -> usize {
        BoundedCache::len(self)
    }

    fn clear(&self) {
        BoundedCache::clear(self)
    }

    fn keys(&self) -> Vec<K> {
        BoundedCache::keys(self)
    }

    fn values(&self) -> Vec<Arc<V>> {
        BoundedCache::values(self)
    }

    fn entries(&self) -> Vec<(K, Arc<V>)> {
        BoundedCache::entries(self)
    }

    fn stats(&self) -> CacheStats {
        BoundedCache::stats(self)
    }

    fn reset_statistics(&self) {
        BoundedCache::reset_statistics(self)
    }

    fn maximum_capacity(&self) -> usize {
        BoundedCache::maximum_capacity(self)
    }

    fn strength(&self) -> ValueStrength {
        H::STRENGTH
    }

    fn purge_reclaimed(&self) -> usize {
        BoundedCache::purge_reclaimed(self)
    }

    fn release_soft_values(&self) -> usize {
        BoundedCache::release_soft_values(self)
    }

    fn is_consistent(&self) -> bool {
        BoundedCache::is_consistent(self)
    }
}

impl<K, V, H> fmt::Debug for BoundedCache<K, V, H>
where
    K: Eq + Hash + Clone,
    H: ValueHolder<V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.read();
        f.debug_struct("BoundedCache")
            .field("strength", &H::STRENGTH)
            .field("len", &core.len())
            .field("maximum_capacity", &core.maximum_capacity())
            .finish()
    }
}
