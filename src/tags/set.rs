//! Key/optional-value tag collections.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// How tag keys are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCase {
    /// Keys differing only in case are distinct.
    #[default]
    Sensitive,
    /// Keys differing only in case are the same key.
    Insensitive,
}

impl KeyCase {
    /// Returns the comparison form of `key`.
    #[must_use]
    pub fn fold(self, key: &str) -> Cow<'_, str> {
        match self {
            Self::Sensitive => Cow::Borrowed(key),
            Self::Insensitive => Cow::Owned(key.to_lowercase()),
        }
    }
}

/// A single tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Key as spelled by its origin.
    pub key: String,
    /// Value; `None` when the remote system stores the key alone.
    pub value: Option<String>,
}

/// An immutable-by-convention set of tags.
///
/// Every set operation returns a new set; nothing mutates in place after
/// construction. Values always compare case-sensitively, and a present
/// empty value is distinct from an absent one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, Option<String>>"
)]
pub struct TagSet {
    key_case: KeyCase,
    /// Folded key -> tag.
    entries: BTreeMap<String, Tag>,
}

impl TagSet {
    /// Creates an empty, case-sensitive tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            key_case: KeyCase::Sensitive,
            entries: BTreeMap::new(),
        }
    }

    /// Builds a set from `(key, value)` pairs where every key has a value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect()
    }

    /// Returns this set re-keyed under `key_case`.
    ///
    /// Keys that collide under the new policy keep the last one in key order.
    #[must_use]
    pub fn with_key_case(self, key_case: KeyCase) -> Self {
        let mut set = Self {
            key_case,
            entries: BTreeMap::new(),
        };
        for tag in self.entries.into_values() {
            set.put(tag);
        }
        set
    }

    /// Returns a copy of this set with `key` set to `value`.
    #[must_use]
    pub fn insert(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.put(Tag {
            key: key.into(),
            value,
        });
        self
    }

    fn put(&mut self, tag: Tag) {
        let folded = self.key_case.fold(&tag.key).into_owned();
        self.entries.insert(folded, tag);
    }

    fn derive<'a>(&self, tags: impl Iterator<Item = &'a Tag>) -> Self {
        let mut set = Self {
            key_case: self.key_case,
            entries: BTreeMap::new(),
        };
        for tag in tags {
            set.put(tag.clone());
        }
        set
    }

    /// Returns the key comparison policy.
    #[must_use]
    pub const fn key_case(&self) -> KeyCase {
        self.key_case
    }

    /// Looks up a tag by key under this set's key policy.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(self.key_case.fold(key).as_ref())
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the keys in their original spelling.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.values().map(|t| t.key.clone()).collect()
    }

    /// Iterates over the tags.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.entries.values()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags in `desired` whose key is absent here.
    #[must_use]
    pub fn added(&self, desired: &Self) -> Self {
        self.derive(desired.iter().filter(|t| !self.contains_key(&t.key)))
    }

    /// Tags here whose key is absent from `desired`.
    #[must_use]
    pub fn removed(&self, desired: &Self) -> Self {
        self.derive(self.iter().filter(|t| !desired.contains_key(&t.key)))
    }

    /// Tags present in both sets with differing values, carrying the desired value.
    #[must_use]
    pub fn updated(&self, desired: &Self) -> Self {
        self.derive(
            desired
                .iter()
                .filter(|t| self.get(&t.key).is_some_and(|cur| cur.value != t.value)),
        )
    }

    /// Tags to send in a single upsert call: added plus updated.
    #[must_use]
    pub fn upserts(&self, desired: &Self) -> Self {
        self.derive(
            desired
                .iter()
                .filter(|t| self.get(&t.key).is_none_or(|cur| cur.value != t.value)),
        )
    }

    /// Tags whose key does NOT satisfy `is_reserved`.
    #[must_use]
    pub fn filter_reserved(&self, is_reserved: impl Fn(&str) -> bool) -> Self {
        self.derive(self.iter().filter(|t| !is_reserved(&t.key)))
    }

    /// Returns true if both sets hold the same keys with the same values.
    ///
    /// Sets under different key policies are never equal; re-key one with
    /// [`TagSet::with_key_case`] first.
    #[must_use]
    pub fn equal(&self, other: &Self) -> bool {
        self.key_case == other.key_case
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|((key, tag), (other_key, other_tag))| {
                    key == other_key && tag.value == other_tag.value
                })
    }

    /// Flattens the set into a plain map, mapping absent values to `""`.
    #[must_use]
    pub fn to_string_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|t| (t.key.clone(), t.value.clone().unwrap_or_default()))
            .collect()
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl Eq for TagSet {}

impl FromIterator<(String, Option<String>)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.put(Tag { key, value });
        }
        set
    }
}

impl From<BTreeMap<String, Option<String>>> for TagSet {
    fn from(map: BTreeMap<String, Option<String>>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HashMap<String, String>> for TagSet {
    fn from(map: HashMap<String, String>) -> Self {
        Self::from_pairs(map)
    }
}

impl From<TagSet> for BTreeMap<String, Option<String>> {
    fn from(set: TagSet) -> Self {
        set.entries
            .into_values()
            .map(|t| (t.key, t.value))
            .collect()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &tag.value {
                Some(value) => write!(f, "{}: {value:?}", tag.key)?,
                None => write!(f, "{}", tag.key)?,
            }
        }
        write!(f, "}}")
    }
}
