//! Teardown of remote objects whose deletion completes asynchronously.
//!
//! Every delete call carries a fresh request token. Objects already gone
//! count as deleted, so a sweep can be re-run after a partial failure.
//! Bulk deletes keep going after a failure and report every failed item at
//! the end; a parent is only deleted once all of its children are gone.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::ErrorAggregator;
use crate::config::WaiterSettings;
use crate::error::{Mutation, ReconcileError, Result, TagwrightError, WaitError};
use crate::remote::{DeleteOutcome, OperationClient};
use crate::waiter::{NotFoundPolicy, WaitOutcome, Waiter, WaiterSpec};

/// How a single delete ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    /// The object did not exist.
    AlreadyAbsent,
    /// The delete call completed synchronously.
    Deleted,
    /// The delete operation was awaited until it finished.
    Awaited(WaitOutcome),
}

/// Summary of a successful teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Objects deleted by this run.
    pub deleted: Vec<String>,
    /// Objects that were already gone.
    pub already_absent: Vec<String>,
}

impl TeardownReport {
    fn record(&mut self, target: &str, result: &DeleteResult) {
        match result {
            DeleteResult::AlreadyAbsent => self.already_absent.push(target.to_string()),
            DeleteResult::Deleted | DeleteResult::Awaited(_) => self.deleted.push(target.to_string()),
        }
    }

    /// Total number of objects handled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deleted.len() + self.already_absent.len()
    }

    /// Returns true if nothing was handled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.already_absent.is_empty()
    }
}

/// Deletes remote objects and waits for the deletions to finish.
pub struct TeardownReconciler<C: OperationClient> {
    /// Remote delete API.
    client: C,
    /// Waiter for asynchronous deletions.
    waiter: Waiter,
    /// Stops bulk deletes and in-flight waits.
    cancel: CancellationToken,
}

impl<C: OperationClient> TeardownReconciler<C> {
    /// Creates a reconciler waiting on deletions with `spec`.
    ///
    /// A vanished target always counts as success.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `spec` is invalid.
    pub fn new(client: C, spec: WaiterSpec) -> Result<Self> {
        let cancel = CancellationToken::new();
        let waiter = Waiter::new(spec.with_not_found(NotFoundPolicy::Succeed))?
            .with_cancellation(cancel.clone());
        Ok(Self {
            client,
            waiter,
            cancel,
        })
    }

    /// Creates a reconciler from a deletion spec tuned by `settings`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the resulting spec is invalid.
    pub fn from_config(client: C, spec: WaiterSpec, settings: &WaiterSettings) -> Result<Self> {
        Self::new(client, settings.apply(spec))
    }

    /// Uses `token` to stop bulk deletes and in-flight waits.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.waiter = self.waiter.with_cancellation(token.clone());
        self.cancel = token;
        self
    }

    /// The wrapped client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Deletes `target` and waits until it is gone.
    ///
    /// # Errors
    ///
    /// Returns a [`ReconcileError::Mutation`] if the delete call fails and a
    /// [`ReconcileError::Wait`] if waiting for the deletion fails.
    pub async fn delete_and_wait(&self, target: &str) -> Result<DeleteResult> {
        let request_token = Uuid::new_v4().to_string();
        debug!("Deleting {target} (request token {request_token})");

        let outcome = match self.client.delete(target, &request_token).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_not_found() => {
                info!("{target} already absent");
                return Ok(DeleteResult::AlreadyAbsent);
            }
            Err(source) => {
                return Err(ReconcileError::Mutation {
                    identifier: target.to_string(),
                    mutation: Mutation::Delete,
                    source,
                }
                .into());
            }
        };

        match outcome {
            DeleteOutcome::Completed => {
                info!("Deleted {target}");
                Ok(DeleteResult::Deleted)
            }
            DeleteOutcome::Pending(handle) => {
                info!("Waiting for deletion of {target} (operation {handle})");
                let client = &self.client;
                let handle = &handle;
                let waited = self
                    .waiter
                    .wait(move || client.describe_operation(target, handle))
                    .await
                    .map_err(|source| ReconcileError::Wait {
                        identifier: target.to_string(),
                        mutation: Mutation::AwaitDelete,
                        source,
                    })?;
                info!("Deleted {target}");
                Ok(DeleteResult::Awaited(waited))
            }
        }
    }

    /// Deletes every target, continuing past failures.
    ///
    /// Once cancelled, remaining targets are not touched and are reported
    /// as cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`TagwrightError::Aggregated`] naming every target that could
    /// not be deleted.
    pub async fn delete_all<I, S>(&self, targets: I) -> Result<TeardownReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = TeardownReport::default();
        let mut failures = ErrorAggregator::new();

        for target in targets {
            let target = target.as_ref();
            if self.cancel.is_cancelled() {
                failures.push(
                    target,
                    ReconcileError::Wait {
                        identifier: target.to_string(),
                        mutation: Mutation::Delete,
                        source: WaitError::Cancelled { last_state: None },
                    },
                );
                continue;
            }
            if let Some(result) = failures.append(target, self.delete_and_wait(target).await) {
                report.record(target, &result);
            }
        }

        failures.error_or_nil()?;
        info!(
            "Teardown finished: {} deleted, {} already absent",
            report.deleted.len(),
            report.already_absent.len()
        );
        Ok(report)
    }

    /// Deletes `children`, then `parent` once every child is gone.
    ///
    /// # Errors
    ///
    /// If any child fails, the parent is left in place and the child
    /// failures are returned together with a
    /// [`ReconcileError::DependentsRemain`] entry for the parent.
    pub async fn teardown<I, S>(&self, parent: &str, children: I) -> Result<TeardownReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = match self.delete_all(children).await {
            Ok(report) => report,
            Err(TagwrightError::Aggregated(mut failed)) => {
                warn!(
                    "Leaving {parent} in place, {} dependent object(s) failed to delete",
                    failed.len()
                );
                let count = failed.len();
                failed.push(
                    parent,
                    ReconcileError::DependentsRemain {
                        identifier: parent.to_string(),
                        failed: count,
                    },
                );
                return Err(failed.into());
            }
            Err(e) => return Err(e),
        };

        let result = self.delete_and_wait(parent).await?;
        report.record(parent, &result);
        Ok(report)
    }
}
