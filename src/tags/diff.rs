//! Tag difference computation.

use serde::Serialize;
use tracing::debug;

use super::reserved::ReservedKeys;
use super::set::TagSet;

/// The three disjoint parts of the difference between two tag sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagDiff {
    /// Keys only in desired state.
    pub added: TagSet,
    /// Keys only in current state.
    pub removed: TagSet,
    /// Keys in both with a changed value, carrying the desired value.
    pub updated: TagSet,
}

impl TagDiff {
    /// Computes the difference converging `current` to `desired`.
    #[must_use]
    pub fn compute(current: &TagSet, desired: &TagSet) -> Self {
        let diff = Self {
            added: current.added(desired),
            removed: current.removed(desired),
            updated: current.updated(desired),
        };

        debug!(
            "Tag diff: {} added, {} removed, {} updated",
            diff.added.len(),
            diff.removed.len(),
            diff.updated.len()
        );

        diff
    }

    /// Drops reserved keys from every part.
    ///
    /// Apply this to a computed diff, never to its inputs: a reserved key
    /// present only remotely must still count as not removable.
    #[must_use]
    pub fn without_reserved(&self, reserved: &ReservedKeys) -> Self {
        let is_reserved = |key: &str| reserved.is_reserved(key);
        Self {
            added: self.added.filter_reserved(is_reserved),
            removed: self.removed.filter_reserved(is_reserved),
            updated: self.updated.filter_reserved(is_reserved),
        }
    }

    /// Returns true if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Tags to upsert: added plus updated.
    #[must_use]
    pub fn to_apply(&self) -> TagSet {
        self.added
            .iter()
            .chain(self.updated.iter())
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect::<TagSet>()
            .with_key_case(self.added.key_case())
    }

    /// Keys to remove.
    #[must_use]
    pub fn removed_keys(&self) -> Vec<String> {
        self.removed.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_scenario() {
        let current = TagSet::from_pairs([("Name", "x"), ("env", "prod")]);
        let desired = TagSet::from_pairs([("Name", "y"), ("team", "core")]);

        let diff = TagDiff::compute(&current, &desired);
        assert_eq!(diff.removed_keys(), vec![String::from("env")]);
        assert_eq!(diff.added, TagSet::from_pairs([("team", "core")]));
        assert_eq!(diff.updated, TagSet::from_pairs([("Name", "y")]));
        assert_eq!(
            diff.to_apply(),
            TagSet::from_pairs([("Name", "y"), ("team", "core")])
        );
    }

    #[test]
    fn test_converged_diff_is_empty() {
        let tags = TagSet::from_pairs([("Name", "x")]);
        assert!(TagDiff::compute(&tags, &tags).is_empty());
    }

    #[test]
    fn test_reserved_remote_keys_are_not_removed() {
        let current = TagSet::from_pairs([
            ("aws:cloudformation:stack-name", "stack"),
            ("Name", "x"),
        ]);
        let desired = TagSet::from_pairs([("Name", "x")]);

        let diff = TagDiff::compute(&current, &desired);
        assert_eq!(diff.removed.len(), 1);

        let filtered = diff.without_reserved(&ReservedKeys::aws());
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_reserved_desired_keys_are_not_sent() {
        let current = TagSet::new();
        let desired = TagSet::from_pairs([("aws:internal", "v"), ("team", "core")]);

        let diff = TagDiff::compute(&current, &desired).without_reserved(&ReservedKeys::aws());
        assert_eq!(diff.to_apply().keys(), vec![String::from("team")]);
    }
}
