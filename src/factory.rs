//! Cache Factory Module
//!
//! Consumers receive a [`CacheFactory`] from bootstrap code instead of
//! constructing caches directly, so the engine behind every cache in a
//! process can be swapped in one place.

use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{
    BoundedCache, Cache, CacheOptions, ListenerResult, SoftCache, Stoppable, ValueStrength,
    WeakCache,
};
use crate::error::Result;

/// Shared handle to a cache created by a factory.
pub type SharedCache<K, V> = Arc<dyn Cache<K, V>>;

// == Cache Factory ==
/// Creates caches. Resolved once at process start and passed to consumers.
pub trait CacheFactory: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &'static str;

    /// Creates a cache from a builder.
    fn create<K, V>(&self, options: CacheOptions<K, V>) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static;

    /// Strong LRU cache without listener.
    fn create_cache<K, V>(
        &self,
        initial_capacity: usize,
        maximum_capacity: usize,
    ) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        self.create(CacheOptions::new(maximum_capacity).initial_capacity(initial_capacity))
    }

    /// Strong LRU cache that reports capacity evictions to `listener`.
    fn create_cache_with_listener<K, V, F>(
        &self,
        initial_capacity: usize,
        maximum_capacity: usize,
        listener: F,
    ) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
        F: Fn(&K, &Arc<V>) -> ListenerResult + Send + Sync + 'static,
    {
        self.create(
            CacheOptions::new(maximum_capacity)
                .initial_capacity(initial_capacity)
                .eviction_listener(listener),
        )
    }

    /// Strong LRU cache that optionally stops evicted values.
    fn create_stopping_cache<K, V>(
        &self,
        initial_capacity: usize,
        maximum_capacity: usize,
        stop_on_eviction: bool,
    ) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Stoppable + Send + Sync + 'static,
    {
        self.create(
            CacheOptions::new(maximum_capacity)
                .initial_capacity(initial_capacity)
                .stop_on_eviction(stop_on_eviction),
        )
    }

    /// Cache whose values are pinned until memory pressure.
    fn create_soft_cache<K, V>(&self, maximum_capacity: usize) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        self.create(CacheOptions::new(maximum_capacity).soft())
    }

    /// Cache whose values live only while held elsewhere.
    fn create_weak_cache<K, V>(&self, maximum_capacity: usize) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        self.create(CacheOptions::new(maximum_capacity).weak())
    }
}

// == LRU Cache Factory ==
/// Default engine: [`BoundedCache`] with the requested value strength.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruCacheFactory;

impl LruCacheFactory {
    pub fn new() -> Self {
        Self
    }
}

impl CacheFactory for LruCacheFactory {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn create<K, V>(&self, options: CacheOptions<K, V>) -> Result<SharedCache<K, V>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let strength = options.get_strength();
        let cache: SharedCache<K, V> = match strength {
            ValueStrength::Strong => Arc::new(BoundedCache::<K, V>::with_options(options)?),
            ValueStrength::Weak => Arc::new(WeakCache::<K, V>::with_options(options)?),
            ValueStrength::Soft => Arc::new(SoftCache::<K, V>::with_options(options)?),
        };
        debug!(engine = self.name(), strength = %strength, "Cache created by factory");
        Ok(cache)
    }
}
