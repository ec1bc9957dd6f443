//! Cache Options Module
//!
//! Construction parameters shared by [`BoundedCache`] and the factories.
//!
//! [`BoundedCache`]: crate::cache::BoundedCache

use std::fmt;
use std::sync::Arc;

use crate::cache::listener::{stop_hook, StopHook};
use crate::cache::{EvictionListener, ListenerResult, Stoppable, ValueStrength};
use crate::cache::DEFAULT_INITIAL_CAPACITY;

// == Cache Options ==
/// Builder for cache construction parameters.
///
/// # Example
/// ```
/// use bounded_cache::cache::{BoundedCache, CacheOptions};
///
/// let options = CacheOptions::<String, u32>::new(100)
///     .initial_capacity(32)
///     .eviction_listener(|key, value| {
///         println!("evicted {key} = {value}");
///         Ok(())
///     });
/// let cache: BoundedCache<String, u32> = BoundedCache::with_options(options).unwrap();
/// assert_eq!(cache.maximum_capacity(), 100);
/// ```
pub struct CacheOptions<K, V> {
    pub(crate) initial_capacity: usize,
    pub(crate) maximum_capacity: usize,
    pub(crate) strength: ValueStrength,
    pub(crate) listener: Option<Arc<dyn EvictionListener<K, V>>>,
    pub(crate) stop_hook: Option<StopHook<V>>,
}

impl<K, V> CacheOptions<K, V> {
    /// Starts a builder with the given hard bound.
    ///
    /// The bound is validated when the cache is built, not here.
    pub fn new(maximum_capacity: usize) -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            maximum_capacity,
            strength: ValueStrength::Strong,
            listener: None,
            stop_hook: None,
        }
    }

    /// Sets the table sizing hint.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn strength(mut self, strength: ValueStrength) -> Self {
        self.strength = strength;
        self
    }

    pub fn strong(self) -> Self {
        self.strength(ValueStrength::Strong)
    }

    pub fn weak(self) -> Self {
        self.strength(ValueStrength::Weak)
    }

    pub fn soft(self) -> Self {
        self.strength(ValueStrength::Soft)
    }

    /// Registers a closure called once per capacity eviction.
    pub fn eviction_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&K, &Arc<V>) -> ListenerResult + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Registers a shared listener implementation.
    pub fn listener(mut self, listener: Arc<dyn EvictionListener<K, V>>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn get_initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn get_maximum_capacity(&self) -> usize {
        self.maximum_capacity
    }

    pub fn get_strength(&self) -> ValueStrength {
        self.strength
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub fn stops_on_eviction(&self) -> bool {
        self.stop_hook.is_some()
    }
}

impl<K, V: Stoppable + 'static> CacheOptions<K, V> {
    /// Calls [`Stoppable::stop`] on each evicted value, after the listener.
    ///
    /// Only available when the value type can be stopped.
    pub fn stop_on_eviction(mut self, enabled: bool) -> Self {
        self.stop_hook = enabled.then(stop_hook::<V>);
        self
    }
}

impl<K, V> fmt::Debug for CacheOptions<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("initial_capacity", &self.initial_capacity)
            .field("maximum_capacity", &self.maximum_capacity)
            .field("strength", &self.strength)
            .field("listener", &self.listener.is_some())
            .field("stop_on_eviction", &self.stop_hook.is_some())
            .finish()
    }
}
