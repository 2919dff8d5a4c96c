//! Reconciliation of remote objects toward their desired state.
//!
//! - [`TagReconciler`] converges tags with the minimal set of mutations
//! - [`TeardownReconciler`] deletes objects and waits for them to be gone

mod tags;
mod teardown;

pub use tags::{MutationOrder, TagReconciler, TagUpdateReport};
pub use teardown::{DeleteResult, TeardownReconciler, TeardownReport};
