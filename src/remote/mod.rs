//! Remote client capabilities consumed by the reconciliation core.
//!
//! Every remote service gets one adapter implementing these traits. The
//! adapter owns the wire calls and classifies each failure into a
//! [`RemoteErrorKind`](crate::error::RemoteErrorKind); the core only ever
//! looks at that classification.

mod client;
mod types;

pub use client::{OperationClient, RemoteResult, TagClient};
pub use types::{DeleteOutcome, Observation, OperationHandle, ProbeStatus};
