//! Tag sets and tag diffing.
//!
//! This module holds the key/value tag model shared by every remote
//! service adapter, the set algebra used to converge remote tags with
//! desired tags, and the reserved-key predicate applied before anything
//! is sent to a remote mutation call.

mod diff;
mod reserved;
mod set;

pub use diff::TagDiff;
pub use reserved::{AWS_RESERVED_PREFIX, ReservedKeys};
pub use set::{KeyCase, Tag, TagSet};
