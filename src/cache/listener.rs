//! Eviction Listener Module
//!
//! Callbacks run when the capacity bound evicts an entry, and the optional
//! stop hook for values that have a lifecycle.
//!
//! Failure policy: a listener or stop hook that returns `Err` is logged,
//! counted in [`CacheStats::listener_failures`], and otherwise ignored. The
//! eviction has already happened and is never retried. A panic unwinds to
//! the caller of `put`; the cache is consistent at that point because
//! dispatch runs after the structural update.
//!
//! [`CacheStats::listener_failures`]: crate::cache::CacheStats::listener_failures

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Error type returned by listeners and stop hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by listeners and stop hooks.
pub type ListenerResult = std::result::Result<(), BoxError>;

// == Eviction Listener ==
/// Receives entries evicted by the capacity bound.
///
/// Not called for explicit `remove`, for `clear`, or when a weak/soft value is
/// reclaimed. Runs synchronously on the thread whose `put` caused the
/// eviction, after the cache lock is released. Listeners should not call back
/// into the same cache; notification order across threads is unspecified.
pub trait EvictionListener<K, V>: Send + Sync {
    fn on_eviction(&self, key: &K, value: &Arc<V>) -> ListenerResult;
}

impl<K, V, F> EvictionListener<K, V> for F
where
    F: Fn(&K, &Arc<V>) -> ListenerResult + Send + Sync,
{
    fn on_eviction(&self, key: &K, value: &Arc<V>) -> ListenerResult {
        self(key, value)
    }
}

// == Stoppable ==
/// Values with a stop/close lifecycle.
///
/// Caches of `Stoppable` values can be built with `stop_on_eviction`, which
/// calls [`Stoppable::stop`] on each evicted value after the listener.
pub trait Stoppable {
    fn stop(&self) -> ListenerResult;
}

impl<T: Stoppable + ?Sized> Stoppable for Box<T> {
    fn stop(&self) -> ListenerResult {
        (**self).stop()
    }
}

/// Type-erased stop hook captured while `V: Stoppable` is known.
pub(crate) type StopHook<V> = Arc<dyn Fn(&V) -> ListenerResult + Send + Sync>;

pub(crate) fn stop_hook<V: Stoppable + 'static>() -> StopHook<V> {
    Arc::new(|value: &V| value.stop())
}

// == Notifier ==
/// Dispatches evictions to the listener and stop hook.
pub(crate) struct Notifier<K, V> {
    listener: Option<Arc<dyn EvictionListener<K, V>>>,
    stop_hook: Option<StopHook<V>>,
    failures: AtomicU64,
}

impl<K, V> Notifier<K, V> {
    pub(crate) fn new(
        listener: Option<Arc<dyn EvictionListener<K, V>>>,
        stop_hook: Option<StopHook<V>>,
    ) -> Self {
        Self {
            listener,
            stop_hook,
            failures: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.listener.is_some() || self.stop_hook.is_some()
    }

    /// Runs the listener, then the stop hook.
    pub(crate) fn notify(&self, key: &K, value: &Arc<V>) {
        if let Some(listener) = &self.listener {
            if let Err(err) = listener.on_eviction(key, value) {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "Eviction listener failed");
            }
        }

        if let Some(stop) = &self.stop_hook {
            if let Err(err) = stop(value.as_ref()) {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "Failed to stop evicted value");
            }
        }
    }

    pub(crate) fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.failures.store(0, Ordering::Relaxed);
    }
}
