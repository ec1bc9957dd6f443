//! Cache Module
//!
//! Provides a bounded, thread-safe LRU cache with strong, weak or soft
//! values and eviction listeners.

mod bounded;
mod holder;
mod listener;
mod lru;
mod options;
mod order;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use bounded::{BoundedCache, Cache, SoftCache, WeakCache};
pub use holder::{SoftValue, StrongValue, ValueHolder, ValueStrength, WeakValue};
pub use listener::{BoxError, EvictionListener, ListenerResult, Stoppable};
pub use lru::{Detached, LruCore, PutOutcome};
pub use options::CacheOptions;
pub use order::{RecencyOrder, Slot};
pub use stats::CacheStats;

// == Public Constants ==
/// Table sizing hint used when none is given
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
