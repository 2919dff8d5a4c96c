// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Tagwright
//!
//! The reconciliation core shared by cloud resource adapters.
//!
//! ## Overview
//!
//! Resource adapters converge remote objects toward a declared state. The
//! pieces every adapter needs live here:
//!
//! - Diffing tag sets and applying the minimal tag mutations
//! - Polling asynchronous operations until they reach a terminal state
//! - Encoding multi-part identifiers into one persisted string
//! - Collecting per-item failures of bulk operations
//!
//! The crate never talks to a cloud API itself. Adapters implement
//! [`TagClient`] and [`OperationClient`] and hand them to the reconcilers.
//!
//! ## Modules
//!
//! - [`tags`]: Tag sets, diffs and reserved keys
//! - [`waiter`]: Polling state machine for asynchronous operations
//! - [`identifier`]: Composite identifier codec
//! - [`aggregate`]: Batch error aggregation
//! - [`remote`]: Client traits implemented by adapters
//! - [`reconciler`]: Tag reconciliation and teardown
//! - [`config`]: Configuration loading and validation
//!
//! ## Configuration
//!
//! ```yaml
//! tags:
//!   reserved_prefixes: ["aws:"]
//!   ignored_keys: [Owner]
//!   mutation_order: sequential
//!
//! waiters:
//!   delete:
//!     interval_ms: 1000
//!     max_interval_ms: 10000
//!     multiplier: 2.0
//!     timeout_secs: 600
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod aggregate;
pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod reconciler;
pub mod remote;
pub mod tags;
pub mod waiter;

// ============================================================================
// Re-exports
// ============================================================================

pub use aggregate::{AggregatedError, ErrorAggregator, ItemFailure};
pub use config::{ConfigParser, ConfigValidator, TagwrightConfig};
pub use error::{Result, TagwrightError};
pub use identifier::{IdentifierCodec, StackSetInstanceId, TagResourceId};
pub use logging::init_logging;
pub use reconciler::{MutationOrder, TagReconciler, TeardownReconciler};
pub use remote::{OperationClient, TagClient};
pub use tags::{ReservedKeys, TagDiff, TagSet};
pub use waiter::{Waiter, WaiterSpec};
