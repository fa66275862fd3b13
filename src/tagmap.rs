//! tagmap is the sorted key, value collection used for the fields of a
//! `Record` and for the tags and fields of a `Point`. Think of it as a
//! specialized map: keys are kept in order so that iteration, equality and
//! serialization are deterministic no matter the order of insertion.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::iter::FromIterator;
use std::slice::Iter;

/// The tagmap key, value collection. Behaves similarly to
/// `std::collections::BTreeMap` but with a specialized implementation for
/// fast searching over a small collection.
#[derive(Clone, Debug, PartialEq)]
pub struct TagMap<K, V> {
    inner: Vec<(K, V)>,
}

impl<K, V> TagMap<K, V>
where
    K: Ord,
{
    /// Create a `tagmap::Iter`. Pairs come back in key order.
    pub fn iter(&self) -> Iter<(K, V)> {
        self.inner.iter()
    }

    /// Iterate the keys of the tagmap, in order.
    pub fn keys<'a>(&'a self) -> impl Iterator<Item = &'a K> + 'a {
        self.inner.iter().map(|&(ref k, _)| k)
    }

    /// Get a value from the tagmap, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: AsRef<Q>,
        Q: Ord + ?Sized,
    {
        match self.inner.binary_search_by(|probe| probe.0.as_ref().cmp(key)) {
            Ok(idx) => Some(&self.inner[idx].1),
            Err(_) => None,
        }
    }

    /// Determine if `key` is present in the tagmap.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: AsRef<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Remove a value from the tagmap. The value will be returned if it
    /// existed.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: AsRef<Q>,
        Q: Ord + ?Sized,
    {
        match self.inner.binary_search_by(|probe| probe.0.as_ref().cmp(key)) {
            Ok(idx) => Some(self.inner.remove(idx).1),
            Err(_) => None,
        }
    }

    /// Determine if the tagmap is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Insert a key / value into self
    ///
    /// This method will return the value previously stored under the given
    /// key, if there was such a value.
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        match self.inner.binary_search_by(|probe| probe.0.cmp(&key)) {
            Ok(idx) => {
                self.inner.push((key, val));
                let old = self.inner.swap_remove(idx);
                Some(old.1)
            }
            Err(idx) => {
                self.inner.insert(idx, (key, val));
                None
            }
        }
    }

    /// Return the length of the tagmap. This is the total number of key /
    /// values stored in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> Default for TagMap<K, V> {
    fn default() -> TagMap<K, V> {
        TagMap {
            inner: Vec::with_capacity(15),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TagMap<K, V>
where
    K: Ord,
{
    fn from_iter<I>(iter: I) -> TagMap<K, V>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = TagMap::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'a, K, V> IntoIterator for &'a TagMap<K, V> {
    type Item = &'a (K, V);
    type IntoIter = Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K, V> Serialize for TagMap<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.inner.iter().map(|&(ref k, ref v)| (k, v)))
    }
}

impl<'de, K, V> Deserialize<'de> for TagMap<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<TagMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map: BTreeMap<K, V> = BTreeMap::deserialize(deserializer)?;
        Ok(TagMap {
            inner: map.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn insert_replaces_and_returns_old_value() {
        let mut map: TagMap<String, u32> = TagMap::default();
        assert_eq!(None, map.insert("b".into(), 1));
        assert_eq!(None, map.insert("a".into(), 2));
        assert_eq!(Some(1), map.insert("b".into(), 3));

        assert_eq!(2, map.len());
        assert_eq!(Some(&3), map.get("b"));
        assert_eq!(Some(&2), map.get("a"));
        assert!(!map.contains_key("c"));
    }

    #[test]
    fn remove_is_by_borrowed_key() {
        let mut map: TagMap<String, u32> = TagMap::default();
        map.insert("host".into(), 1);
        assert_eq!(Some(1), map.remove("host"));
        assert_eq!(None, map.remove("host"));
        assert!(map.is_empty());
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let map: TagMap<String, i64> =
            vec![("z".to_string(), 1), ("a".to_string(), 2)].into_iter().collect();
        let json = ::serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a":2,"z":1}"#);

        let back: TagMap<String, i64> = ::serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn iteration_is_sorted_regardless_of_insertion_order() {
        fn inner(pairs: Vec<(String, u16)>) -> TestResult {
            let map: TagMap<String, u16> = pairs.iter().cloned().collect();
            let keys: Vec<&String> = map.keys().collect();
            let mut sorted = keys.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(keys, sorted);
            for &(ref k, _) in &pairs {
                assert!(map.contains_key(k.as_str()));
            }
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<(String, u16)>) -> TestResult);
    }
}
