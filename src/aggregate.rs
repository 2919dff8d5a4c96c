//! Batch error aggregation.
//!
//! Bulk operations (sweeps, teardown of many associations) keep going after
//! an item fails and report every failure at the end. [`ErrorAggregator`]
//! collects the failures; [`ErrorAggregator::error_or_nil`] turns an empty
//! collection into success.

use std::fmt;

use thiserror::Error;
use tracing::error;

use crate::error::TagwrightError;

/// One failed item of a bulk operation.
#[derive(Debug)]
pub struct ItemFailure {
    /// Identifier of the item that failed.
    pub item: String,
    /// What went wrong.
    pub error: TagwrightError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            // Reconciliation errors already name the item.
            TagwrightError::Reconcile(inner) => write!(f, "{inner}"),
            other => write!(f, "{}: {other}", self.item),
        }
    }
}

/// Every failure of a bulk operation, in the order they occurred.
///
/// Never empty: an aggregator without failures yields `Ok(())` instead.
#[derive(Debug, Error)]
pub struct AggregatedError {
    failures: Vec<ItemFailure>,
}

impl AggregatedError {
    /// The recorded failures.
    #[must_use]
    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    /// Iterates over the failures.
    pub fn iter(&self) -> impl Iterator<Item = &ItemFailure> {
        self.failures.iter()
    }

    /// Identifiers of the failed items.
    #[must_use]
    pub fn items(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.item.as_str()).collect()
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Adds a failure, e.g. a parent skipped because of these failures.
    pub fn push(&mut self, item: impl Into<String>, err: impl Into<TagwrightError>) {
        self.failures.push(ItemFailure {
            item: item.into(),
            error: err.into(),
        });
    }

    /// Consumes the error, returning the failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<ItemFailure> {
        self.failures
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {noun} occurred:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n\t* {failure}")?;
        }
        Ok(())
    }
}

/// Collects per-item failures without stopping the bulk operation.
///
/// Not synchronized: each concurrent bulk operation owns its aggregator.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    failures: Vec<ItemFailure>,
}

impl ErrorAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failures: Vec::new(),
        }
    }

    /// Records `result` for `item`; successes are passed through untouched.
    pub fn append<T, E>(&mut self, item: impl Into<String>, result: Result<T, E>) -> Option<T>
    where
        E: Into<TagwrightError>,
    {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(item, err);
                None
            }
        }
    }

    /// Records a failure for `item`.
    pub fn push(&mut self, item: impl Into<String>, err: impl Into<TagwrightError>) {
        let failure = ItemFailure {
            item: item.into(),
            error: err.into(),
        };
        error!("{failure}");
        self.failures.push(failure);
    }

    /// Moves every failure of `other` into this aggregator.
    pub fn extend(&mut self, other: Self) {
        self.failures.extend(other.failures);
    }

    /// Number of failures recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if nothing failed so far.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(())` when nothing failed, otherwise every failure.
    ///
    /// # Errors
    ///
    /// Returns an [`AggregatedError`] listing each recorded failure.
    pub fn error_or_nil(self) -> Result<(), AggregatedError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(AggregatedError {
                failures: self.failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Mutation, ReconcileError, RemoteError};

    fn delete(item: &str) -> Result<(), RemoteError> {
        if item == "b" {
            Err(RemoteError::fatal("ValidationError", "cannot delete b"))
        } else {
            Ok(())
        }
    }

    #[test]
    fn test_only_failed_items_are_reported() {
        let mut aggregator = ErrorAggregator::new();
        for item in ["a", "b", "c"] {
            aggregator.append(item, delete(item));
        }

        let err = aggregator.error_or_nil().expect_err("b failed");
        let message = err.to_string();

        assert_eq!(err.items(), vec!["b"]);
        assert!(message.contains("b: "));
        assert!(!message.contains("a: "));
        assert!(!message.contains("c: "));
        assert!(message.starts_with("1 error occurred:"));
    }

    #[test]
    fn test_no_errors_is_nil() {
        let mut aggregator = ErrorAggregator::new();
        for item in ["a", "c"] {
            assert_eq!(aggregator.append(item, delete(item)), Some(()));
        }
        assert!(aggregator.is_empty());
        assert!(aggregator.error_or_nil().is_ok());
    }

    #[test]
    fn test_every_failure_is_kept_in_order() {
        let mut aggregator = ErrorAggregator::new();
        aggregator.push("first", RemoteError::transient("Throttling", "slow down"));
        aggregator.push("second", RemoteError::fatal("AccessDenied", "no"));

        let mut other = ErrorAggregator::new();
        other.push("third", RemoteError::not_found("NotFound", "gone"));
        aggregator.extend(other);

        let err = aggregator.error_or_nil().expect_err("three failures");
        assert_eq!(err.len(), 3);
        assert_eq!(err.items(), vec!["first", "second", "third"]);

        assert!(err.iter().all(|f| !f.item.is_empty()));

        let message = err.to_string();
        assert!(message.starts_with("3 errors occurred:"));
        assert!(message.contains("Throttling"));
        assert!(message.contains("AccessDenied"));
    }

    #[test]
    fn test_reconcile_failures_name_the_item_once() {
        let mut aggregator = ErrorAggregator::new();
        aggregator.push(
            "stack-a",
            ReconcileError::Mutation {
                identifier: "stack-a".to_string(),
                mutation: Mutation::Delete,
                source: RemoteError::fatal("AccessDenied", "no"),
            },
        );
        aggregator.push("stack-b", RemoteError::fatal("Boom", "boom"));

        let message = aggregator.error_or_nil().expect_err("two failures").to_string();

        assert_eq!(message.matches("stack-a").count(), 1);
        assert!(!message.contains("Reconciliation error"));
        assert!(message.contains("\n\t* stack-b: Remote error:"));
    }

    #[test]
    fn test_aggregated_error_converts_to_crate_error() {
        let mut aggregator = ErrorAggregator::new();
        aggregator.push("x", RemoteError::fatal("Boom", "boom"));
        let err: TagwrightError = aggregator.error_or_nil().expect_err("one failure").into();
        assert!(matches!(err, TagwrightError::Aggregated(ref agg) if agg.len() == 1));
    }
}
