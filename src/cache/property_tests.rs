//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a simple reference model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{BoundedCache, CacheOptions, ListenerResult, WeakCache};

// == Test Configuration ==
const KEY_SPACE: u8 = 16;

// == Strategies ==
/// Small key space so puts, gets and removes collide often
fn key_strategy() -> impl Strategy<Value = u8> {
    0..KEY_SPACE
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32 },
    Get { key: u8 },
    Remove { key: u8 },
    ContainsKey { key: u8 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => key_strategy().prop_map(|key| CacheOp::ContainsKey { key }),
    ]
}

// == Reference Model ==
/// Obviously-correct LRU: a Vec ordered oldest first.
struct Model {
    order: Vec<u8>,
    values: HashMap<u8, u32>,
    capacity: usize,
    evicted: Vec<(u8, u32)>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            order: Vec::new(),
            values: HashMap::new(),
            capacity,
            evicted: Vec::new(),
        }
    }

    fn touch(&mut self, key: u8) {
        self.order.retain(|k| *k != key);
        self.order.push(key);
    }

    fn put(&mut self, key: u8, value: u32) -> Option<u32> {
        if let Some(previous) = self.values.insert(key, value) {
            self.touch(key);
            return Some(previous);
        }
        if self.order.len() >= self.capacity {
            let oldest = self.order.remove(0);
            let evicted = self.values.remove(&oldest).unwrap();
            self.evicted.push((oldest, evicted));
        }
        self.order.push(key);
        None
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        let value = self.values.get(&key).copied()?;
        self.touch(key);
        Some(value)
    }

    fn remove(&mut self, key: u8) -> Option<u32> {
        let value = self.values.remove(&key)?;
        self.order.retain(|k| *k != key);
        Some(value)
    }
}

fn recording_cache(capacity: usize) -> (BoundedCache<u8, u32>, Arc<Mutex<Vec<(u8, u32)>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let options = CacheOptions::new(capacity).eviction_listener(
        move |key: &u8, value: &Arc<u32>| -> ListenerResult {
            sink.lock().push((*key, **value));
            Ok(())
        },
    );
    (BoundedCache::<_, _>::with_options(options).unwrap(), log)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of operations, the cache SHALL agree with the
    // reference model on every returned value and on the recency order.
    #[test]
    fn prop_matches_reference_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..120)
    ) {
        let (cache, log) = recording_cache(capacity);
        let mut model = Model::new(capacity);

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let previous = cache.insert(key, value).map(|v| *v);
                    prop_assert_eq!(previous, model.put(key, value));
                }
                CacheOp::Get { key } => {
                    let value = cache.get(&key).map(|v| *v);
                    prop_assert_eq!(value, model.get(key));
                }
                CacheOp::Remove { key } => {
                    let value = cache.remove(&key).map(|v| *v);
                    prop_assert_eq!(value, model.remove(key));
                }
                CacheOp::ContainsKey { key } => {
                    prop_assert_eq!(cache.contains_key(&key), model.values.contains_key(&key));
                }
            }
            prop_assert_eq!(cache.keys(), model.order.clone());
            prop_assert!(cache.is_consistent());
        }

        // Listener saw exactly the evictions, in order
        prop_assert_eq!(log.lock().clone(), model.evicted.clone());
        prop_assert_eq!(cache.stats().evictions, model.evicted.len() as u64);
    }

    // *For any* sequence of puts, resident size SHALL never exceed the bound.
    #[test]
    fn prop_capacity_enforcement(
        capacity in 1usize..50,
        entries in prop::collection::vec((any::<u16>(), any::<u32>()), 1..200)
    ) {
        let cache: BoundedCache<u16, u32> = BoundedCache::new(0, capacity).unwrap();

        for (key, value) in entries {
            cache.insert(key, value);
            prop_assert!(
                cache.len() <= capacity,
                "Cache size {} exceeds max {}",
                cache.len(),
                capacity
            );
        }
        prop_assert!(cache.is_consistent());
    }

    // *For any* filled cache, membership tests SHALL NOT change which
    // entry is evicted next.
    #[test]
    fn prop_contains_key_does_not_promote(
        capacity in 2usize..10,
        lookups in prop::collection::vec(0usize..10, 0..20)
    ) {
        let cache: BoundedCache<usize, usize> = BoundedCache::new(0, capacity).unwrap();
        for key in 0..capacity {
            cache.insert(key, key);
        }
        for key in lookups {
            cache.contains_key(&key);
            let _ = cache.peek(&key);
        }

        cache.insert(capacity, capacity);
        prop_assert!(!cache.contains_key(&0), "key 0 was oldest and must be evicted");
        prop_assert_eq!(cache.len(), capacity);
    }

    // *For any* mix of held and dropped values, a weak cache SHALL only
    // report the held ones and never notify the listener for reclaimed ones.
    #[test]
    fn prop_weak_reclamation_is_silent(
        held in prop::collection::vec(any::<bool>(), 1..30)
    ) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let options = CacheOptions::<usize, usize>::new(held.len())
            .weak()
            .eviction_listener(move |key, _| {
                sink.lock().push(*key);
                Ok(())
            });
        let cache = WeakCache::with_options(options).unwrap();

        let mut owners = Vec::new();
        for (key, keep) in held.iter().enumerate() {
            let value = Arc::new(key);
            cache.put(key, Arc::clone(&value));
            if *keep {
                owners.push(value);
            }
        }

        let expected: Vec<usize> = owners.iter().map(|v| **v).collect();
        prop_assert_eq!(cache.keys(), expected);
        for (key, keep) in held.iter().enumerate() {
            prop_assert_eq!(cache.get(&key).is_some(), *keep);
        }
        prop_assert!(log.lock().is_empty());
        prop_assert!(cache.is_consistent());
    }
}

// == Property Test for Concurrent Operation Correctness ==
// Shared access to a BoundedCache from many tasks at once

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // *For any* set of concurrent operations, the cache SHALL stay within its
    // bound, keep table and recency order consistent, and count one listener
    // call per eviction.
    #[test]
    fn prop_concurrent_operation_correctness(
        capacity in 1usize..16,
        operations in prop::collection::vec(
            prop::collection::vec(cache_op_strategy(), 10..60),
            2..8
        )
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let (cache, log) = recording_cache(capacity);
            let cache = Arc::new(cache);

            let mut handles = vec![];
            for ops in operations {
                let cache = Arc::clone(&cache);
                handles.push(tokio::task::spawn_blocking(move || {
                    for op in ops {
                        match op {
                            CacheOp::Put { key, value } => {
                                cache.insert(key, value);
                            }
                            CacheOp::Get { key } => {
                                cache.get(&key);
                            }
                            CacheOp::Remove { key } => {
                                cache.remove(&key);
                            }
                            CacheOp::ContainsKey { key } => {
                                cache.contains_key(&key);
                            }
                        }
                        assert!(cache.len() <= capacity);
                    }
                }));
            }

            for handle in handles {
                handle.await.expect("Task should not panic");
            }

            prop_assert!(cache.len() <= capacity, "Cache should not exceed max entries");
            prop_assert!(cache.is_consistent(), "Table and recency order diverged");

            let stats = cache.stats();
            prop_assert_eq!(stats.evictions, log.lock().len() as u64);

            let hit_rate = stats.hit_rate();
            prop_assert!((0.0..=1.0).contains(&hit_rate));

            Ok(())
        })?;
    }
}
