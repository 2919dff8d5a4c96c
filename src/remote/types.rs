//! Values exchanged with remote client adapters.

use std::fmt;

use serde::Serialize;

/// Handle of an asynchronous remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    /// Creates a handle.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw operation id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of issuing a delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The object is gone once the call returns.
    Completed,
    /// Deletion continues asynchronously.
    Pending(OperationHandle),
}

/// A state reported by a status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Remote state name, e.g. `RUNNING` or `SUCCEEDED`.
    pub state: String,
    /// Remote explanation, mostly present on failure states.
    pub reason: Option<String>,
}

/// What one tick of a status probe saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The target exists and is in the observed state.
    Found(Observation),
    /// The target does not exist.
    NotFound,
}

impl ProbeStatus {
    /// Creates a `Found` status without a reason.
    #[must_use]
    pub fn state(state: impl Into<String>) -> Self {
        Self::Found(Observation {
            state: state.into(),
            reason: None,
        })
    }

    /// Creates a `Found` status carrying a reason.
    #[must_use]
    pub fn state_with_reason(state: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Found(Observation {
            state: state.into(),
            reason: Some(reason.into()),
        })
    }
}
