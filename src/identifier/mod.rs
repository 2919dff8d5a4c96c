//! Composite remote identifiers.
//!
//! Resources whose remote identity spans several fields (a stack set name,
//! an account and a region, or a resource ARN and a tag key) persist that
//! identity as a single opaque string. This module packs and unpacks those
//! strings losslessly.

mod codec;
mod typed;

pub use codec::{IdentifierCodec, DEFAULT_SEPARATOR};
pub use typed::{StackSetInstanceId, TagResourceId};
