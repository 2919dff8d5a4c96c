//! Error types for the tagwright reconciliation core.
//!
//! This module provides the error hierarchy for every stage of a
//! reconciliation pass: identifier decoding, remote calls, waiting on
//! asynchronous operations, configuration and batch aggregation.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::aggregate::AggregatedError;

/// The main error type for the tagwright core.
#[derive(Debug, Error)]
pub enum TagwrightError {
    /// Composite identifier errors.
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// Errors reported by a remote client adapter.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Errors raised while waiting for an asynchronous operation.
    #[error("Wait error: {0}")]
    Wait(#[from] WaitError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Several independent failures collected during a bulk operation.
    #[error("{0}")]
    Aggregated(#[from] AggregatedError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by the composite identifier codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// A field contains the separator and cannot be encoded losslessly.
    #[error("identifier field {index} ({field:?}) contains the separator {separator:?}")]
    InvalidField {
        /// Position of the offending field.
        index: usize,
        /// The offending field.
        field: String,
        /// The codec separator.
        separator: char,
    },

    /// A field is empty.
    #[error("identifier field {index} is empty")]
    EmptyField {
        /// Position of the empty field.
        index: usize,
    },

    /// No fields were supplied.
    #[error("identifier must have at least one field")]
    NoFields,

    /// A persisted identifier does not have the expected shape.
    #[error(
        "unexpected format for identifier ({id}), expected {expected} non-empty fields separated by {separator:?}, found {found}"
    )]
    Malformed {
        /// The identifier as persisted.
        id: String,
        /// Number of fields expected.
        expected: usize,
        /// Number of segments found.
        found: usize,
        /// The codec separator.
        separator: char,
    },
}

/// Classification of a remote failure, decided by the client adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The remote object does not exist.
    NotFound,
    /// Network, throttling or other conditions worth retrying.
    Transient,
    /// Permanent failure, e.g. a validation error.
    Fatal,
}

/// An error returned by a remote client adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} ({code}): {message}")]
pub struct RemoteError {
    /// Structured classification.
    pub kind: RemoteErrorKind,
    /// Service specific error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
}

/// Errors raised by the waiter.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The deadline elapsed before a terminal state was reached.
    #[error("timeout after {timeout:?} waiting for a terminal state (last state: {})", display_state(.last_state.as_deref()))]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
        /// Last intermediate state observed, if any.
        last_state: Option<String>,
    },

    /// The caller cancelled the wait; the remote outcome is unknown.
    #[error("wait cancelled (last state: {})", display_state(.last_state.as_deref()))]
    Cancelled {
        /// Last state observed before cancellation.
        last_state: Option<String>,
    },

    /// The probe reported a terminal failure state.
    #[error("operation reached failure state {state}{}", display_reason(.reason.as_deref()))]
    Failed {
        /// The failure state.
        state: String,
        /// Cause reported by the remote system.
        reason: Option<String>,
    },

    /// The probe reported a state outside every configured set.
    #[error("unexpected state {state}, wanted target {expected:?}")]
    UnexpectedState {
        /// The reported state.
        state: String,
        /// Configured target states.
        expected: Vec<String>,
    },

    /// The target was not found and the policy does not tolerate it.
    #[error("target not found after {elapsed:?}")]
    NotFound {
        /// Time spent waiting when the condition was escalated.
        elapsed: Duration,
    },

    /// The probe returned a non-retryable remote error.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// The remote mutation a reconciliation step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mutation {
    /// Reading current tags.
    TagList,
    /// Adding or updating tags.
    TagAdd,
    /// Removing tags.
    TagRemove,
    /// Issuing a delete call.
    Delete,
    /// Waiting for a delete operation to complete.
    AwaitDelete,
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A remote mutation failed.
    #[error("{mutation} failed for {identifier}: {source}")]
    Mutation {
        /// Remote identifier the call targeted.
        identifier: String,
        /// The mutation that failed.
        mutation: Mutation,
        /// Underlying remote error.
        source: RemoteError,
    },

    /// Waiting for an asynchronous operation failed.
    #[error("{mutation} failed for {identifier}: {source}")]
    Wait {
        /// Remote identifier the operation targeted.
        identifier: String,
        /// The mutation being awaited.
        mutation: Mutation,
        /// Underlying waiter error.
        source: WaitError,
    },

    /// The parent was left in place because children failed to delete.
    #[error("skipped deleting {identifier}: {failed} dependent object(s) failed to delete")]
    DependentsRemain {
        /// Parent identifier.
        identifier: String,
        /// Number of children that failed.
        failed: usize,
    },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize logging: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for tagwright operations.
pub type Result<T> = std::result::Result<T, TagwrightError>;

fn display_state(state: Option<&str>) -> &str {
    state.unwrap_or("none")
}

fn display_reason(reason: Option<&str>) -> String {
    reason.map_or_else(String::new, |r| format!(": {r}"))
}

impl TagwrightError {
    /// Returns true if this error is worth retrying at a higher level.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_retryable(),
            Self::Reconcile(ReconcileError::Mutation { source, .. }) => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if the remote object was reported absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_not_found(),
            Self::Reconcile(ReconcileError::Mutation { source, .. }) => source.is_not_found(),
            Self::Wait(WaitError::NotFound { .. }) => true,
            _ => false,
        }
    }
}

impl RemoteError {
    /// Creates a remote error of the given kind.
    #[must_use]
    pub fn new(kind: RemoteErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, code, message)
    }

    /// Creates a transient error.
    #[must_use]
    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transient, code, message)
    }

    /// Creates a fatal error.
    #[must_use]
    pub fn fatal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Fatal, code, message)
    }

    /// Returns true if the waiter may retry after this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, RemoteErrorKind::Transient)
    }

    /// Returns true if the remote object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, RemoteErrorKind::NotFound)
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Transient => write!(f, "transient"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagList => write!(f, "tag-list"),
            Self::TagAdd => write!(f, "tag-add"),
            Self::TagRemove => write!(f, "tag-remove"),
            Self::Delete => write!(f, "delete"),
            Self::AwaitDelete => write!(f, "await-delete"),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}
