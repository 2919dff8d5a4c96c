//! Configuration types for the reconciliation core.
//!
//! These types map to the `tagwright.yaml` file. Every field has a default,
//! so an empty document is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::reconciler::MutationOrder;
use crate::tags::{AWS_RESERVED_PREFIX, KeyCase, ReservedKeys};
use crate::waiter::{
    Backoff, DEFAULT_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_MULTIPLIER, DEFAULT_NOT_FOUND_GRACE,
    DEFAULT_TIMEOUT, NotFoundPolicy, WaiterSpec,
};

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TagwrightConfig {
    /// Tag reconciliation settings.
    #[serde(default)]
    pub tags: TagsConfig,
    /// Waiter tuning.
    #[serde(default)]
    pub waiters: WaitersConfig,
}

/// Tag reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagsConfig {
    /// Key prefixes owned by the platform and never mutated.
    #[serde(default = "default_reserved_prefixes")]
    pub reserved_prefixes: Vec<String>,
    /// Exact keys never mutated.
    #[serde(default)]
    pub ignored_keys: Vec<String>,
    /// Whether keys compare case-sensitively.
    #[serde(default)]
    pub key_case: KeyCase,
    /// Relation between the removal and tagging calls.
    #[serde(default)]
    pub mutation_order: MutationOrder,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            reserved_prefixes: default_reserved_prefixes(),
            ignored_keys: Vec::new(),
            key_case: KeyCase::default(),
            mutation_order: MutationOrder::default(),
        }
    }
}

impl TagsConfig {
    /// The reserved key policy described by this section.
    #[must_use]
    pub fn reserved_keys(&self) -> ReservedKeys {
        ReservedKeys::with_prefixes(self.reserved_prefixes.iter().cloned())
            .with_keys(self.ignored_keys.iter().cloned())
    }
}

/// Waiter tuning for each kind of wait.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WaitersConfig {
    /// Waits on creations.
    #[serde(default)]
    pub create: WaiterSettings,
    /// Waits on deletions.
    #[serde(default)]
    pub delete: WaiterSettings,
}

/// Timing of one kind of wait.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaiterSettings {
    /// First polling interval in milliseconds.
    pub interval_ms: u64,
    /// Cap on the polling interval in milliseconds.
    pub max_interval_ms: u64,
    /// Interval growth factor; 1 polls at a fixed interval.
    pub multiplier: f64,
    /// Overall timeout in seconds.
    pub timeout_secs: u64,
    /// Delay before the first probe in milliseconds.
    pub initial_delay_ms: u64,
    /// How long a missing target is tolerated during creation waits, in seconds.
    pub not_found_grace_secs: u64,
}

impl Default for WaiterSettings {
    fn default() -> Self {
        Self {
            interval_ms: millis(DEFAULT_INTERVAL),
            max_interval_ms: millis(DEFAULT_MAX_INTERVAL),
            multiplier: DEFAULT_MULTIPLIER,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            initial_delay_ms: 0,
            not_found_grace_secs: DEFAULT_NOT_FOUND_GRACE.as_secs(),
        }
    }
}

impl WaiterSettings {
    /// The backoff described by these settings.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        let initial = Duration::from_millis(self.interval_ms);
        if (self.multiplier - 1.0).abs() < f64::EPSILON {
            Backoff::Fixed(initial)
        } else {
            Backoff::Exponential {
                initial,
                multiplier: self.multiplier,
                max: Duration::from_millis(self.max_interval_ms),
            }
        }
    }

    /// Overall timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Applies these timings to `spec`, keeping its state sets.
    ///
    /// A grace-period not-found policy takes the configured grace.
    #[must_use]
    pub fn apply(&self, spec: WaiterSpec) -> WaiterSpec {
        let not_found = match spec.not_found {
            NotFoundPolicy::RetryFor(_) => {
                NotFoundPolicy::RetryFor(Duration::from_secs(self.not_found_grace_secs))
            }
            other => other,
        };
        spec.with_backoff(self.backoff())
            .with_timeout(self.timeout())
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_not_found(not_found)
    }
}

fn default_reserved_prefixes() -> Vec<String> {
    vec![AWS_RESERVED_PREFIX.to_string()]
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
