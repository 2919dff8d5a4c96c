//! Waiter configuration.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::ConfigError;

/// Default overall timeout of a wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default first polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default cap on the polling interval.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(10);

/// Default interval growth factor.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default window during which a freshly created target may be reported missing.
pub const DEFAULT_NOT_FOUND_GRACE: Duration = Duration::from_secs(20);

/// How the delay between two probes evolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every probe.
    Fixed(Duration),
    /// Delay multiplied by `multiplier` after every probe, capped at `max`.
    Exponential {
        /// First delay.
        initial: Duration,
        /// Growth factor, at least 1.
        multiplier: f64,
        /// Upper bound.
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            initial: DEFAULT_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            max: DEFAULT_MAX_INTERVAL,
        }
    }
}

impl Backoff {
    /// Delay to sleep after the `n`th probe (zero based).
    #[must_use]
    pub fn delay(&self, n: u32) -> Duration {
        match *self {
            Self::Fixed(interval) => interval,
            Self::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let exponent = i32::try_from(n).unwrap_or(i32::MAX);
                let secs = initial.as_secs_f64() * multiplier.powi(exponent);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }

    /// The first delay.
    #[must_use]
    pub fn first(&self) -> Duration {
        self.delay(0)
    }
}

/// How the waiter treats a probe reporting the target as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// The target disappearing is the goal (deletion waits).
    Succeed,
    /// Keep polling while less than the grace period has elapsed since the
    /// wait started, then fail (creation waits).
    RetryFor(Duration),
    /// Fail immediately.
    Fail,
}

/// Configuration of a single wait.
#[derive(Debug, Clone, PartialEq)]
pub struct WaiterSpec {
    /// States meaning "keep polling". When empty, every state outside the
    /// target and failure sets counts as pending.
    pub pending: Vec<String>,
    /// States meaning success.
    pub target: Vec<String>,
    /// States meaning failure.
    pub failure: Vec<String>,
    /// Delay before the first probe.
    pub initial_delay: Duration,
    /// Delay between probes.
    pub backoff: Backoff,
    /// Overall deadline, measured from the start of the wait.
    pub timeout: Duration,
    /// Handling of "not found" probe results.
    pub not_found: NotFoundPolicy,
}

fn owned<I, S>(states: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    states.into_iter().map(Into::into).collect()
}

impl WaiterSpec {
    /// Creates a spec waiting for one of `target` while in one of `pending`.
    pub fn new<P, T, S1, S2>(pending: P, target: T) -> Self
    where
        P: IntoIterator<Item = S1>,
        T: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            pending: owned(pending),
            target: owned(target),
            failure: Vec::new(),
            initial_delay: Duration::ZERO,
            backoff: Backoff::default(),
            timeout: DEFAULT_TIMEOUT,
            not_found: NotFoundPolicy::Fail,
        }
    }

    /// Spec for waiting on a creation: a missing target is tolerated for
    /// [`DEFAULT_NOT_FOUND_GRACE`].
    pub fn creation<P, T, S1, S2>(pending: P, target: T) -> Self
    where
        P: IntoIterator<Item = S1>,
        T: IntoIterator<Item = S2>,
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::new(pending, target).with_not_found(NotFoundPolicy::RetryFor(DEFAULT_NOT_FOUND_GRACE))
    }

    /// Spec for waiting on a deletion: a missing target means success.
    pub fn deletion<P, S>(pending: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(pending, Vec::<String>::new()).with_not_found(NotFoundPolicy::Succeed)
    }

    /// Sets the failure states.
    #[must_use]
    pub fn with_failure<I, S>(mut self, failure: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure = owned(failure);
        self
    }

    /// Sets the target states.
    #[must_use]
    pub fn with_target<I, S>(mut self, target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = owned(target);
        self
    }

    /// Sets the backoff policy.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the overall timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay before the first probe.
    #[must_use]
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Sets the not-found policy.
    #[must_use]
    pub const fn with_not_found(mut self, not_found: NotFoundPolicy) -> Self {
        self.not_found = not_found;
        self
    }

    /// Checks the invariants of this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout does not exceed the first polling
    /// interval, the backoff is degenerate, the state sets overlap, or no
    /// terminal success is reachable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backoff {
            Backoff::Fixed(interval) if interval.is_zero() => {
                return Err(ConfigError::validation(
                    "polling interval must be greater than zero",
                    "backoff.interval",
                ));
            }
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                if initial.is_zero() {
                    return Err(ConfigError::validation(
                        "initial polling interval must be greater than zero",
                        "backoff.initial",
                    ));
                }
                if !multiplier.is_finite() || multiplier < 1.0 {
                    return Err(ConfigError::validation(
                        format!("backoff multiplier must be at least 1, got {multiplier}"),
                        "backoff.multiplier",
                    ));
                }
                if max < initial {
                    return Err(ConfigError::validation(
                        "maximum polling interval must not be below the initial interval",
                        "backoff.max",
                    ));
                }
            }
            Backoff::Fixed(_) => {}
        }

        if self.timeout <= self.backoff.first() {
            return Err(ConfigError::validation(
                format!(
                    "timeout {:?} must exceed the polling interval {:?}",
                    self.timeout,
                    self.backoff.first()
                ),
                "timeout",
            ));
        }

        let sets = [
            ("pending", &self.pending),
            ("target", &self.target),
            ("failure", &self.failure),
        ];
        for (i, (name_a, a)) in sets.iter().enumerate() {
            let a: HashSet<&str> = a.iter().map(String::as_str).collect();
            for (name_b, b) in sets.iter().skip(i + 1) {
                if let Some(state) = b.iter().find(|s| a.contains(s.as_str())) {
                    return Err(ConfigError::validation(
                        format!("state {state} is both {name_a} and {name_b}"),
                        *name_b,
                    ));
                }
            }
        }

        if self.target.is_empty() && self.not_found != NotFoundPolicy::Succeed {
            return Err(ConfigError::validation(
                "at least one target state is required unless not-found means success",
                "target",
            ));
        }

        Ok(())
    }
}
