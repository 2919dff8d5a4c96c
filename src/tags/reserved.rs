//! Provider-reserved tag keys.

use std::collections::BTreeSet;

/// Key namespace reserved by AWS for tags it manages itself.
pub const AWS_RESERVED_PREFIX: &str = "aws:";

/// Predicate marking tag keys owned by the provider or explicitly ignored.
///
/// Reserved keys take part in no remote mutation: the reconciler never
/// removes them when they appear remotely and never sends them when they
/// appear in desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedKeys {
    prefixes: Vec<String>,
    keys: BTreeSet<String>,
}

impl ReservedKeys {
    /// Reserves nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            keys: BTreeSet::new(),
        }
    }

    /// Reserves the `aws:` namespace.
    #[must_use]
    pub fn aws() -> Self {
        Self::with_prefixes([AWS_RESERVED_PREFIX])
    }

    /// Reserves every key starting with one of `prefixes`.
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            keys: BTreeSet::new(),
        }
    }

    /// Additionally reserves the exact `keys`.
    #[must_use]
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Returns true if `key` is reserved.
    #[must_use]
    pub fn is_reserved(&self, key: &str) -> bool {
        self.keys.contains(key) || self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    /// Reserved prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
