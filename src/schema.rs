//! Schema: the immutable set of keys a container may hold.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Key;

/// Immutable key set shared between a container and everything derived
/// from it. Cloning is an `Arc` bump.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Schema {
    keys: Arc<HashSet<Key>>,
}

impl Schema {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: Arc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    /// Keys in ascending order, as used in error messages and snapshots.
    pub fn sorted(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.keys.iter().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Sorted keys yielded by `keys` that are not members of this schema.
    pub fn extra<'a, I>(&self, keys: I) -> Vec<Key>
    where
        I: IntoIterator<Item = &'a Key>,
    {
        let mut extra: Vec<Key> = keys
            .into_iter()
            .filter(|k| !self.contains(k))
            .cloned()
            .collect();
        extra.sort_unstable();
        extra
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.sorted()).finish()
    }
}

impl<K: Into<Key>> FromIterator<K> for Schema {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Schema::new(iter)
    }
}

impl<const N: usize> From<[&str; N]> for Schema {
    fn from(keys: [&str; N]) -> Self {
        Schema::new(keys)
    }
}

impl From<Vec<String>> for Schema {
    fn from(keys: Vec<String>) -> Self {
        Schema::new(keys)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Key>::deserialize(deserializer).map(Schema::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_and_extra_are_ordered() {
        let s = Schema::new(["title", "description", "priority"]);
        assert_eq!(s.sorted(), vec!["description", "priority", "title"]);

        let input: Vec<Key> = vec!["zeta".into(), "title".into(), "alpha".into()];
        assert_eq!(s.extra(&input), vec!["alpha", "zeta"]);
    }

    #[test]
    fn serde_uses_sorted_list() {
        let s = Schema::new(["b", "a"]);
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"["a","b"]"#);
        let back: Schema = serde_json::from_str(r#"["b","a","a"]"#).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn clones_share_storage() {
        let s = Schema::new(["a"]);
        let t = s.clone();
        assert!(s.ptr_eq(&t));
        assert!(!s.ptr_eq(&Schema::new(["a"])));
        assert_eq!(s, Schema::new(["a"]));
    }
}
