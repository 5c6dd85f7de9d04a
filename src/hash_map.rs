use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::DefaultHashBuilder;
use crate::hash_table::HashTable;
use crate::hash_table::LoadFactor;
use crate::hash_table::TryReserveError;

/// A hash map implemented over the linear-probing [`HashTable`].
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash keys. The
/// underlying storage is the open-addressing table from
/// [`hash_table`](crate::hash_table): lazily allocated, linearly probed,
/// with tombstone deletion and doubling growth.
///
/// Because growth may fail under memory pressure, [`insert`](HashMap::insert)
/// returns a `Result`; every other operation is infallible.
///
/// The caller obligation of the raw table is discharged here by the standard
/// `Hash`/`Eq` contract: equal keys must hash identically.
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash map with the given hasher builder.
    ///
    /// No storage is allocated until the first insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use probe_hash::HashMap;
    ///
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(RandomState::new());
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_load_factor_and_hasher(LoadFactor::DEFAULT, hash_builder)
    }

    /// Creates a new hash map with the given growth threshold and hasher
    /// builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use probe_hash::HashMap;
    /// use probe_hash::LoadFactor;
    ///
    /// let lf = LoadFactor::new(1, 2).unwrap();
    /// let map: HashMap<i32, i32, _> = HashMap::with_load_factor_and_hasher(lf, RandomState::new());
    /// assert!(map.is_empty());
    /// ```
    pub fn with_load_factor_and_hasher(load_factor: LoadFactor, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_load_factor(load_factor),
            hash_builder,
        }
    }

    /// Returns the number of key-value pairs in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the map's backing array.
    ///
    /// Zero until the first insertion allocates.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `Ok(None)` is returned. If
    /// the map did have this key present, the value is updated in place and
    /// the old value is returned. Growing the backing storage may fail, in
    /// which case the map is unchanged and still usable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// assert_eq!(map.insert(37, "a").unwrap(), None);
    /// assert_eq!(map.insert(37, "b").unwrap(), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// # }
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TryReserveError> {
        let hash = self.hash_builder.hash_one(&key);
        let old = self
            .table
            .insert(hash, |(k1, _), (k2, _)| k1 == k2, (key, value))?;
        Ok(old.map(|(_, v)| v))
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// # }
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// # }
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_mut(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes a key from the map, returning the value at the key if the
    /// key was previously in the map.
    ///
    /// The removed value is handed back to the caller rather than dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// # }
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if
    /// the key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| k == key)
    }

    /// Removes all key-value pairs from the map, keeping the allocated
    /// storage.
    ///
    /// Returns the number of pairs dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    ///
    /// assert_eq!(map.clear(), 2);
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn clear(&mut self) -> usize {
        self.table.clear()
    }

    /// Removes all key-value pairs and releases the backing storage,
    /// returning the map to its unallocated state.
    ///
    /// The map remains usable; the next insertion allocates from scratch.
    pub fn reset(&mut self) {
        self.table.reset()
    }

    /// Returns an iterator over the key-value pairs of the map, in
    /// arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "foldhash")]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map with the given growth threshold using the
    /// default hasher builder.
    pub fn with_load_factor(load_factor: LoadFactor) -> Self {
        Self::with_load_factor_and_hasher(load_factor, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 0);

        let map2 = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "hello".to_string()).unwrap(), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()).unwrap(),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_get_mut() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        assert!(!map.contains_key(&1));

        map.insert(1, "value".to_string()).unwrap();
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_remove() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();
        map.insert(2, "world".to_string()).unwrap();

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&3), None);
    }

    #[test]
    fn test_remove_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();

        assert_eq!(map.remove_entry(&1), Some((1, "hello".to_string())));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_clear_reports_count() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();
        map.insert(2, "world".to_string()).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.clear(), 2);
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert!(!map.contains_key(&1));
        assert!(!map.contains_key(&2));

        assert_eq!(map.clear(), 0);
    }

    #[test]
    fn test_reset() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string()).unwrap();
        assert!(map.capacity() > 0);

        map.reset();
        assert_eq!(map.capacity(), 0);
        assert!(map.is_empty());

        map.insert(2, "again".to_string()).unwrap();
        assert_eq!(map.get(&2), Some(&"again".to_string()));
    }

    #[test]
    fn test_iterators() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string()).unwrap();
        map.insert(2, "two".to_string()).unwrap();
        map.insert(3, "three".to_string()).unwrap();

        let pairs: std::collections::HashMap<i32, String> =
            map.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get(&1), Some(&"one".to_string()));
        assert_eq!(pairs.get(&2), Some(&"two".to_string()));
        assert_eq!(pairs.get(&3), Some(&"three".to_string()));

        let keys: std::collections::HashSet<i32> = map.keys().copied().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&1));
        assert!(keys.contains(&2));
        assert!(keys.contains(&3));

        let values: std::collections::HashSet<String> = map.values().cloned().collect();
        assert_eq!(values.len(), 3);
        assert!(values.contains("one"));
        assert!(values.contains("two"));
        assert!(values.contains("three"));
    }

    #[test]
    fn test_multiple_insertions() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        for i in 0..100 {
            map.insert(i, format!("value_{}", i)).unwrap();
        }

        assert_eq!(map.len(), 100);

        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&format!("value_{}", i)));
        }
    }

    #[test]
    fn test_collision_handling() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            map.insert(i, i * 2).unwrap();
        }

        assert_eq!(map.len(), 1000);

        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..1000).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }

        assert_eq!(map.len(), 500);

        for i in (1..1000).step_by(2) {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn test_string_keys() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        map.insert("hello".to_string(), 1).unwrap();
        map.insert("world".to_string(), 2).unwrap();
        map.insert("rust".to_string(), 3).unwrap();

        assert_eq!(map.get(&"hello".to_string()), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get(&"rust".to_string()), Some(&3));
        assert_eq!(map.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_default_trait() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_custom_load_factor() {
        let lf = LoadFactor::new(1, 4).unwrap();
        let mut map: HashMap<i32, i32, SipHashBuilder> = HashMap::with_load_factor(lf);

        for i in 0..32 {
            map.insert(i, i).unwrap();
        }
        // With a 1/4 threshold the table has grown well past the element
        // count.
        assert!(map.capacity() >= 128);
        for i in 0..32 {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_complex_values() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        let vec1 = vec![1, 2, 3];
        let vec2 = vec![4, 5, 6];

        map.insert("first".to_string(), vec1.clone()).unwrap();
        map.insert("second".to_string(), vec2.clone()).unwrap();

        assert_eq!(map.get(&"first".to_string()), Some(&vec1));
        assert_eq!(map.get(&"second".to_string()), Some(&vec2));

        if let Some(v) = map.get_mut(&"first".to_string()) {
            v.push(4);
        }

        assert_eq!(map.get(&"first".to_string()), Some(&vec![1, 2, 3, 4]));
    }

    // Exercises the reference sequence of inserts, overwrites, removals,
    // and misses end to end.
    #[test]
    fn test_insert_remove_reinsert_sequence() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, 1).unwrap(), None);
        assert_eq!(map.insert(2, 2).unwrap(), None);
        assert_eq!(map.insert(3, 3).unwrap(), None);

        assert_eq!(map.get(&3), Some(&3));
        assert_eq!(map.remove(&3), Some(3));
        assert_eq!(map.get(&3), None);

        assert_eq!(map.remove(&2), Some(2));
        assert_eq!(map.get(&2), None);

        assert_eq!(map.insert(1, 1).unwrap(), Some(1));
        assert_eq!(map.insert(1, 3).unwrap(), Some(1));
        assert_eq!(map.get(&1), Some(&3));

        assert_eq!(map.get(&69), None);
    }
}
