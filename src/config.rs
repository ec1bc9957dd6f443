//! Configuration Module
//!
//! Handles loading and managing process configuration from environment variables.

use std::env;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::cache::{ValueStrength, DEFAULT_INITIAL_CAPACITY};
use crate::error::{CacheError, Result};

/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Table sizing hint for created caches
    pub initial_capacity: usize,
    /// Hard bound on entries per cache
    pub max_capacity: usize,
    /// How cached values are held
    pub value_strength: ValueStrength,
    /// Stop evicted values that support it
    pub stop_on_eviction: bool,
    /// Start the background warm-up at boot
    pub warm_up: bool,
    /// Number of concurrent soak workers
    pub workers: usize,
    /// Soak run length in seconds
    pub run_seconds: u64,
    /// Number of distinct keys the soak workers touch
    pub key_space: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_INITIAL_CAPACITY` - Table sizing hint (default: 16)
    /// - `CACHE_MAX_CAPACITY` - Maximum entries (default: 1000)
    /// - `CACHE_VALUE_STRENGTH` - strong, weak or soft (default: strong)
    /// - `CACHE_STOP_ON_EVICTION` - Stop evicted values (default: false)
    /// - `CACHE_WARM_UP` - Run warm-up at boot (default: true)
    /// - `SOAK_WORKERS` - Concurrent workers (default: 4)
    /// - `SOAK_DURATION_SECS` - Run length (default: 5)
    /// - `SOAK_KEY_SPACE` - Distinct keys (default: 4096)
    ///
    /// Fails with [`CacheError::InvalidConfig`] if a set variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    ///
    /// Unset values fall back to defaults. Set values must parse, so a
    /// negative capacity or an unknown strength is rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            initial_capacity: parse_or(&lookup, "CACHE_INITIAL_CAPACITY", defaults.initial_capacity)?,
            max_capacity: parse_or(&lookup, "CACHE_MAX_CAPACITY", defaults.max_capacity)?,
            value_strength: parse_or(&lookup, "CACHE_VALUE_STRENGTH", defaults.value_strength)?,
            stop_on_eviction: parse_or(
                &lookup,
                "CACHE_STOP_ON_EVICTION",
                defaults.stop_on_eviction,
            )?,
            warm_up: parse_or(&lookup, "CACHE_WARM_UP", defaults.warm_up)?,
            workers: parse_or(&lookup, "SOAK_WORKERS", defaults.workers)?,
            run_seconds: parse_or(&lookup, "SOAK_DURATION_SECS", defaults.run_seconds)?,
            key_space: parse_or(&lookup, "SOAK_KEY_SPACE", defaults.key_space)?,
        })
    }

    /// Rejects values no cache or workload could run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "CACHE_MAX_CAPACITY must be greater than zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(CacheError::InvalidConfig(
                "SOAK_WORKERS must be greater than zero".to_string(),
            ));
        }
        if self.key_space == 0 {
            return Err(CacheError::InvalidConfig(
                "SOAK_KEY_SPACE must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: 1000,
            value_strength: ValueStrength::Strong,
            stop_on_eviction: false,
            warm_up: true,
            workers: 4,
            run_seconds: 5,
            key_space: 4096,
        }
    }
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    raw.trim().parse().map_err(|_| {
        warn!(variable = name, value = %raw, "Rejected unparseable configuration value");
        CacheError::InvalidConfig(format!("{name} has invalid value {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.max_capacity, 1000);
        assert_eq!(config.value_strength, ValueStrength::Strong);
        assert!(!config.stop_on_eviction);
        assert!(config.warm_up);
        assert_eq!(config.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_empty_lookup() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_from_lookup_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("CACHE_INITIAL_CAPACITY", "64"),
            ("CACHE_MAX_CAPACITY", " 250 "),
            ("CACHE_VALUE_STRENGTH", "soft"),
            ("CACHE_STOP_ON_EVICTION", "true"),
            ("CACHE_WARM_UP", "false"),
            ("SOAK_WORKERS", "8"),
            ("SOAK_DURATION_SECS", "30"),
            ("SOAK_KEY_SPACE", "100"),
        ]))
        .unwrap();

        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.max_capacity, 250);
        assert_eq!(config.value_strength, ValueStrength::Soft);
        assert!(config.stop_on_eviction);
        assert!(!config.warm_up);
        assert_eq!(config.workers, 8);
        assert_eq!(config.run_seconds, 30);
        assert_eq!(config.key_space, 100);
    }

    #[test]
    fn test_config_rejects_negative_capacity() {
        let result = Config::from_lookup(lookup_from(&[("CACHE_INITIAL_CAPACITY", "-1")]));
        match result {
            Err(CacheError::InvalidConfig(message)) => {
                assert!(message.contains("CACHE_INITIAL_CAPACITY"));
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_unparseable_values() {
        for (name, raw) in [
            ("CACHE_MAX_CAPACITY", "lots"),
            ("CACHE_VALUE_STRENGTH", "phantom"),
            ("CACHE_WARM_UP", "maybe"),
            ("SOAK_DURATION_SECS", "-5"),
        ] {
            let result = Config::from_lookup(lookup_from(&[(name, raw)]));
            assert!(
                matches!(result, Err(CacheError::InvalidConfig(_))),
                "{} = {} should be rejected",
                name,
                raw
            );
        }
    }

    #[test]
    fn test_config_validate_rejects_zero() {
        let config = Config {
            max_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));

        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["value_strength"], "strong");
        assert_eq!(json["max_capacity"], 1000);
    }
}
