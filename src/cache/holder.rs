//! Value Holder Module
//!
//! Defines how a cache entry keeps its value alive: strongly, weakly, or
//! softly (strong until memory pressure is signalled).

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Value Strength ==
/// Reference strength used for stored values. Keys are always held strongly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueStrength {
    /// Values stay resident until evicted or removed
    #[default]
    Strong,
    /// Values survive only while some caller still holds an `Arc`
    Weak,
    /// Values are pinned until [`release_soft_values`] is called, then behave as weak
    ///
    /// [`release_soft_values`]: crate::cache::BoundedCache::release_soft_values
    Soft,
}

impl fmt::Display for ValueStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueStrength::Strong => "strong",
            ValueStrength::Weak => "weak",
            ValueStrength::Soft => "soft",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ValueStrength {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(ValueStrength::Strong),
            "weak" => Ok(ValueStrength::Weak),
            "soft" => Ok(ValueStrength::Soft),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown value strength '{}', expected strong, weak or soft",
                other
            ))),
        }
    }
}

// == Value Holder ==
/// Strategy for holding a cached value.
///
/// The cache core is generic over this trait, so the strong, weak and soft
/// variants share one eviction implementation.
pub trait ValueHolder<V>: Send + Sync {
    /// Strength this holder implements.
    const STRENGTH: ValueStrength;

    /// Whether the value may disappear without the cache removing it.
    const RECLAIMABLE: bool;

    /// Wraps a value for storage.
    fn hold(value: Arc<V>) -> Self;

    /// Returns the value if it has not been reclaimed.
    fn value(&self) -> Option<Arc<V>>;

    /// Checks liveness without handing out a new `Arc`.
    fn is_live(&self) -> bool {
        self.value().is_some()
    }

    /// Detaches any pin the holder keeps on the value. Called on memory pressure.
    ///
    /// The pin is handed back so the caller decides where the last `Arc`
    /// is dropped.
    fn release(&mut self) -> Option<Arc<V>> {
        None
    }
}

// == Strong Value ==
/// Holds the value with a strong `Arc`.
#[derive(Debug)]
pub struct StrongValue<V>(Arc<V>);

impl<V: Send + Sync> ValueHolder<V> for StrongValue<V> {
    const STRENGTH: ValueStrength = ValueStrength::Strong;
    const RECLAIMABLE: bool = false;

    fn hold(value: Arc<V>) -> Self {
        Self(value)
    }

    fn value(&self) -> Option<Arc<V>> {
        Some(Arc::clone(&self.0))
    }

    fn is_live(&self) -> bool {
        true
    }
}

// == Weak Value ==
/// Holds only a `Weak` reference; the entry dies with the last outside `Arc`.
#[derive(Debug)]
pub struct WeakValue<V>(Weak<V>);

impl<V: Send + Sync> ValueHolder<V> for WeakValue<V> {
    const STRENGTH: ValueStrength = ValueStrength::Weak;
    const RECLAIMABLE: bool = true;

    fn hold(value: Arc<V>) -> Self {
        Self(Arc::downgrade(&value))
    }

    fn value(&self) -> Option<Arc<V>> {
        self.0.upgrade()
    }

    fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

// == Soft Value ==
/// Pins the value until memory pressure releases the pin.
///
/// After [`ValueHolder::release`] the holder behaves exactly like [`WeakValue`].
#[derive(Debug)]
pub struct SoftValue<V> {
    pinned: Option<Arc<V>>,
    weak: Weak<V>,
}

impl<V: Send + Sync> ValueHolder<V> for SoftValue<V> {
    const STRENGTH: ValueStrength = ValueStrength::Soft;
    const RECLAIMABLE: bool = true;

    fn hold(value: Arc<V>) -> Self {
        Self {
            weak: Arc::downgrade(&value),
            pinned: Some(value),
        }
    }

    fn value(&self) -> Option<Arc<V>> {
        match &self.pinned {
            Some(value) => Some(Arc::clone(value)),
            None => self.weak.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        self.pinned.is_some() || self.weak.strong_count() > 0
    }

    fn release(&mut self) -> Option<Arc<V>> {
        self.pinned.take()
    }
}
