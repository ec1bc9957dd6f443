//! Cache Warm-Up Task
//!
//! Fire-and-forget task that exercises the cache code paths once per
//! process so the first real caller does not pay for cold code and
//! allocator paths. Purely a latency optimization: skipping it changes
//! nothing observable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::cache::{BoundedCache, CacheOptions, SoftCache, WeakCache};
use crate::error::Result;

static PROCESS_WARM_UP: WarmUp = WarmUp::new();

/// Starts the process-wide warm-up if no earlier call did.
///
/// Call this explicitly from bootstrap code. Returns true if this call
/// started the warm-up, false if it had already been started.
///
/// Runs on the current tokio runtime's blocking pool when called inside a
/// runtime, otherwise on a dedicated thread.
///
/// # Example
/// ```
/// bounded_cache::tasks::warm_up();
/// // Later calls are no-ops
/// assert!(!bounded_cache::tasks::warm_up());
/// ```
pub fn warm_up() -> bool {
    PROCESS_WARM_UP.start()
}

/// Returns true once the process-wide warm-up has finished.
pub fn is_warmed_up() -> bool {
    PROCESS_WARM_UP.is_done()
}

// == Warm Up ==
/// Idempotent warm-up guard.
pub struct WarmUp {
    started: AtomicBool,
    done: AtomicBool,
}

impl Default for WarmUp {
    fn default() -> Self {
        Self::new()
    }
}

impl WarmUp {
    pub const fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            done: AtomicBool::new(false),
        }
    }

    /// Spawns the warm-up unless already started. Returns whether it was spawned.
    pub fn start(&'static self) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Cache warm-up already started");
            return false;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                // detached: the JoinHandle is dropped on purpose
                drop(handle.spawn_blocking(move || self.run()));
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("cache-warm-up".to_string())
                    .spawn(move || self.run());
                if let Err(err) = spawned {
                    warn!(error = %err, "Failed to spawn cache warm-up thread");
                }
            }
        }
        true
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn run(&self) {
        let started = Instant::now();
        match exercise() {
            Ok(()) => {
                self.done.store(true, Ordering::Release);
                debug!(
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "Cache warm-up complete"
                );
            }
            Err(err) => warn!(error = %err, "Cache warm-up failed"),
        }
    }
}

/// Runs every variant through put, get, eviction and sweep once.
fn exercise() -> Result<()> {
    let strong = BoundedCache::<u64, u64>::with_options(
        CacheOptions::<u64, u64>::new(8)
            .initial_capacity(8)
            .eviction_listener(|_, _| Ok(())),
    )?;
    for i in 0..32u64 {
        strong.insert(i, i);
        strong.get(&(i / 2));
        strong.contains_key(&i);
    }
    strong.keys();
    strong.clear();

    let weak = WeakCache::<u64, u64>::new(8, 8)?;
    let held: Vec<Arc<u64>> = (0..16u64).map(Arc::new).collect();
    for value in &held {
        weak.put(**value, Arc::clone(value));
    }
    drop(held);
    weak.purge_reclaimed();

    let soft = SoftCache::<u64, u64>::new(8, 8)?;
    for i in 0..16u64 {
        soft.insert(i, i);
    }
    soft.release_soft_values();

    Ok(())
}
