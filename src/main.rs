//! Bounded Cache - soak runner
//!
//! Boots the cache the way a host process would (configuration, warm-up,
//! factory) and drives it from several workers until stopped, then prints
//! the final statistics.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bounded_cache::{
    tasks, CacheFactory, CacheOptions, Config, ListenerResult, LruCacheFactory, SharedCache,
    Stoppable, ValueStrength,
};

/// Values a weak-cache worker keeps alive so lookups can still hit.
const HELD_PER_WORKER: usize = 64;

/// Sessions stopped on eviction.
static STOPPED_SESSIONS: AtomicU64 = AtomicU64::new(0);

/// Payload cached by the soak workers.
struct Session {
    id: u64,
}

impl Stoppable for Session {
    fn stop(&self) -> ListenerResult {
        STOPPED_SESSIONS.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Main entry point for the soak runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Start the background warm-up
/// 4. Create the cache through the factory
/// 5. Start the workers
/// 6. Stop on Ctrl+C, SIGTERM or when the run time elapses
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bounded_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bounded cache soak runner");

    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: max_capacity={}, strength={}, stop_on_eviction={}, workers={}, run={}s",
        config.max_capacity,
        config.value_strength,
        config.stop_on_eviction,
        config.workers,
        config.run_seconds
    );

    if config.warm_up && tasks::warm_up() {
        info!("Cache warm-up started");
    }

    let factory = LruCacheFactory::new();
    let notified = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&notified);
    let options = CacheOptions::<u64, Session>::new(config.max_capacity)
        .initial_capacity(config.initial_capacity)
        .strength(config.value_strength)
        .stop_on_eviction(config.stop_on_eviction)
        .eviction_listener(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
    let cache = factory
        .create(options)
        .context("failed to create cache")?;
    info!(engine = factory.name(), "Cache created");

    let running = Arc::new(AtomicBool::new(true));
    let mut workers = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let cache = Arc::clone(&cache);
        let running = Arc::clone(&running);
        let key_space = config.key_space;
        workers.push(tokio::task::spawn_blocking(move || {
            run_worker(worker as u64, cache, running, key_space)
        }));
    }
    info!(workers = workers.len(), "Workers started");

    wait_for_stop(Duration::from_secs(config.run_seconds)).await;
    running.store(false, Ordering::Release);

    let mut operations = 0u64;
    for handle in workers {
        operations += handle.await.context("worker panicked")?;
    }

    ensure!(
        cache.len() <= cache.maximum_capacity(),
        "cache holds {} entries, bound is {}",
        cache.len(),
        cache.maximum_capacity()
    );
    ensure!(cache.is_consistent(), "cache table and recency order diverged");

    let stats = cache.stats();
    info!(
        operations,
        listener_calls = notified.load(Ordering::Relaxed),
        stopped = STOPPED_SESSIONS.load(Ordering::Relaxed),
        hit_rate = stats.hit_rate(),
        warmed_up = tasks::is_warmed_up(),
        "Soak run complete"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("failed to serialize statistics")?
    );

    cache.clear();
    Ok(())
}

/// Cycles through the key space with a get-then-put workload until stopped.
///
/// Returns the number of operations performed.
fn run_worker(
    worker: u64,
    cache: SharedCache<u64, Session>,
    running: Arc<AtomicBool>,
    key_space: u64,
) -> u64 {
    let mut held = VecDeque::with_capacity(HELD_PER_WORKER);
    let mut operations = 0u64;
    let mut cursor = worker.wrapping_mul(7919);

    while running.load(Ordering::Acquire) {
        cursor = cursor.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let key = (cursor >> 33) % key_space;

        match cache.get(&key) {
            Some(session) => debug_assert_eq!(session.id, key),
            None => {
                let session = Arc::new(Session { id: key });
                cache.put(key, Arc::clone(&session));
                if cache.strength() == ValueStrength::Weak {
                    if held.len() == HELD_PER_WORKER {
                        held.pop_front();
                    }
                    held.push_back(session);
                }
            }
        }
        operations += 1;

        if operations % 10_000 == 0 && cache.strength() == ValueStrength::Soft {
            cache.release_soft_values();
        }
    }
    operations
}

/// Waits for Ctrl+C, SIGTERM or the run timer, whichever comes first.
async fn wait_for_stop(run_time: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping workers...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping workers...");
        }
        _ = tokio::time::sleep(run_time) => {
            info!("Run time elapsed, stopping workers...");
        }
    }
}
