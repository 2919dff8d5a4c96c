//! Waiting on asynchronous remote operations.
//!
//! A [`Waiter`] repeatedly invokes a caller-supplied probe, sleeping
//! between probes according to a [`Backoff`] policy, until the probe
//! reports a target state, a failure state, or the deadline passes. The
//! treatment of "not found" answers is part of the [`WaiterSpec`] so that
//! deletion waits and creation waits share one loop.

mod poller;
mod spec;

pub use poller::{WaitOutcome, Waiter};
pub use spec::{
    Backoff, DEFAULT_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_MULTIPLIER, DEFAULT_NOT_FOUND_GRACE,
    DEFAULT_TIMEOUT, NotFoundPolicy, WaiterSpec,
};
