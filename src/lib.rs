//! Bounded Cache - A thread-safe, size-bounded LRU cache
//!
//! Provides least-recently-used eviction with strong, weak or soft values,
//! eviction listeners and an injectable cache factory.

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod tasks;

pub use cache::{
    BoundedCache, Cache, CacheOptions, CacheStats, EvictionListener, ListenerResult, SoftCache,
    Stoppable, ValueStrength, WeakCache,
};
pub use config::Config;
pub use error::{CacheError, Result};
pub use factory::{CacheFactory, LruCacheFactory, SharedCache};
pub use tasks::warm_up;
