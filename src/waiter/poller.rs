//! Polling state machine.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, WaitError};
use crate::remote::{ProbeStatus, RemoteResult};

use super::spec::{NotFoundPolicy, WaiterSpec};

/// Result of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitOutcome {
    /// Target state reached, or `None` when success was the target vanishing.
    pub state: Option<String>,
    /// Number of probes issued.
    pub attempts: u32,
    /// Time spent waiting.
    pub elapsed: Duration,
}

/// Outcome of classifying one probe result.
enum Tick {
    Done(Option<String>),
    Continue,
}

/// Polls a probe until it reports a terminal state, the deadline passes or
/// the caller cancels.
///
/// A waiter holds no state between calls to [`Waiter::wait`]; give each
/// concurrent reconciliation its own instance when they need separate
/// cancellation.
#[derive(Debug, Clone)]
pub struct Waiter {
    spec: WaiterSpec,
    cancel: CancellationToken,
}

impl Waiter {
    /// Creates a waiter after validating `spec`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `spec` violates its invariants.
    pub fn new(spec: WaiterSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            cancel: CancellationToken::new(),
        })
    }

    /// Uses `token` to cancel in-flight waits.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The configuration this waiter runs.
    #[must_use]
    pub const fn spec(&self) -> &WaiterSpec {
        &self.spec
    }

    /// Polls `probe` until a terminal state.
    ///
    /// Not-found probe errors are handled like [`ProbeStatus::NotFound`];
    /// transient errors are retried until the deadline; fatal errors end
    /// the wait immediately. Cancellation and the deadline also interrupt a
    /// probe still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Failed`] on a failure state,
    /// [`WaitError::Timeout`] when the deadline passes,
    /// [`WaitError::Cancelled`] when the cancellation token fires,
    /// [`WaitError::NotFound`] when a missing target is not tolerated,
    /// [`WaitError::UnexpectedState`] on a state outside every set, and
    /// [`WaitError::Remote`] on a fatal probe error.
    pub async fn wait<F, Fut>(&self, mut probe: F) -> std::result::Result<WaitOutcome, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<ProbeStatus>>,
    {
        let start = Instant::now();
        let deadline = start + self.spec.timeout;
        let mut last_state: Option<String> = None;
        let mut attempts: u32 = 0;

        if !self.spec.initial_delay.is_zero() {
            let wake = (start + self.spec.initial_delay).min(deadline);
            self.pause_until(wake, last_state.as_deref()).await?;
        }

        loop {
            if self.cancel.is_cancelled() {
                return Err(WaitError::Cancelled { last_state });
            }

            attempts = attempts.saturating_add(1);

            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("Wait cancelled while polling");
                    return Err(WaitError::Cancelled { last_state });
                }
                result = probe() => result,
                () = sleep_until(deadline) => return Err(self.timed_out(last_state)),
            };

            match result {
                Ok(status) => {
                    if let Tick::Done(state) = self.classify(status, start, &mut last_state)? {
                        let elapsed = start.elapsed();
                        info!("Wait finished after {attempts} probe(s) in {elapsed:?}");
                        return Ok(WaitOutcome {
                            state,
                            attempts,
                            elapsed,
                        });
                    }
                }
                Err(e) if e.is_not_found() => {
                    if let Tick::Done(state) =
                        self.classify(ProbeStatus::NotFound, start, &mut last_state)?
                    {
                        let elapsed = start.elapsed();
                        info!("Wait finished, target gone after {attempts} probe(s)");
                        return Ok(WaitOutcome {
                            state,
                            attempts,
                            elapsed,
                        });
                    }
                }
                Err(e) if e.is_retryable() => {
                    warn!("Transient error while polling (attempt {attempts}): {e}");
                }
                Err(e) => return Err(WaitError::Remote(e)),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(last_state));
            }

            let delay = self.spec.backoff.delay(attempts - 1);
            let wake = (now + delay).min(deadline);
            debug!("Next probe in {:?}", wake - now);
            self.pause_until(wake, last_state.as_deref()).await?;
        }
    }

    fn timed_out(&self, last_state: Option<String>) -> WaitError {
        warn!(
            "Timed out after {:?} (last state: {})",
            self.spec.timeout,
            last_state.as_deref().unwrap_or("none")
        );
        WaitError::Timeout {
            timeout: self.spec.timeout,
            last_state,
        }
    }

    fn classify(
        &self,
        status: ProbeStatus,
        start: Instant,
        last_state: &mut Option<String>,
    ) -> std::result::Result<Tick, WaitError> {
        match status {
            ProbeStatus::Found(observation) => {
                let state = observation.state;
                if self.spec.target.contains(&state) {
                    debug!("Reached target state {state}");
                    return Ok(Tick::Done(Some(state)));
                }
                if self.spec.failure.contains(&state) {
                    return Err(WaitError::Failed {
                        state,
                        reason: observation.reason,
                    });
                }
                if self.spec.pending.is_empty() || self.spec.pending.contains(&state) {
                    debug!("Still pending in state {state}");
                    *last_state = Some(state);
                    return Ok(Tick::Continue);
                }
                Err(WaitError::UnexpectedState {
                    state,
                    expected: self.spec.target.clone(),
                })
            }
            ProbeStatus::NotFound => match self.spec.not_found {
                NotFoundPolicy::Succeed => Ok(Tick::Done(None)),
                NotFoundPolicy::RetryFor(grace) => {
                    let elapsed = start.elapsed();
                    if elapsed < grace {
                        debug!("Target not found yet after {elapsed:?}, retrying");
                        Ok(Tick::Continue)
                    } else {
                        Err(WaitError::NotFound { elapsed })
                    }
                }
                NotFoundPolicy::Fail => Err(WaitError::NotFound {
                    elapsed: start.elapsed(),
                }),
            },
        }
    }

    async fn pause_until(
        &self,
        wake: Instant,
        last_state: Option<&str>,
    ) -> std::result::Result<(), WaitError> {
        tokio::select! {
            () = sleep_until(wake) => Ok(()),
            () = self.cancel.cancelled() => {
                debug!("Wait cancelled while sleeping");
                Err(WaitError::Cancelled {
                    last_state: last_state.map(String::from),
                })
            }
        }
    }
}
