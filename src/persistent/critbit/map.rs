//! [`PersistentCritBitMap`], the tree handle, and its iterators.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::persistent::ReferenceCounter;

use super::insert::insert_combine;
use super::key::ByteKey;
use super::node::{Extremity, Node, NodeRef};
use super::update::{Rebuilt, update_lookup};
use super::validate::{CritBitError, check};

/// Number of pending subtrees an iterator keeps inline before spilling to
/// the heap. Every internal node on the current path may leave one behind.
const INLINE_STACK_DEPTH: usize = 32;

// =============================================================================
// PersistentCritBitMap Definition
// =============================================================================

/// A persistent (immutable) ordered map based on a crit-bit trie.
///
/// `PersistentCritBitMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// Keys implement [`ByteKey`]: they are compared and branched on as byte
/// sequences, and iteration visits them in ascending byte order.
///
/// # Time Complexity
///
/// Let `L` be the key length in bytes and `D` the depth of the trie (at most
/// `9 * L`, about `log2 N` for typical keys).
///
/// | Operation         | Complexity   |
/// |-------------------|--------------|
/// | `new`             | O(1)         |
/// | `get`             | O(D + L)     |
/// | `insert`          | O(D + L)     |
/// | `update`/`remove` | O(D + L)     |
/// | `min`/`max`       | O(D)         |
/// | `len`             | O(1)         |
/// | `is_empty`        | O(1)         |
///
/// # Examples
///
/// ```rust
/// use critmap::persistent::PersistentCritBitMap;
///
/// let map = PersistentCritBitMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
///
/// // Ordered iteration
/// let map = PersistentCritBitMap::new()
///     .insert("c".to_string(), 3)
///     .insert("a".to_string(), 1)
///     .insert("b".to_string(), 2);
///
/// let keys: Vec<&String> = map.keys().collect();
/// assert_eq!(keys, vec!["a", "b", "c"]);
/// ```
pub struct PersistentCritBitMap<K, V> {
    /// Root node of the trie, absent when the map is empty
    root: Option<NodeRef<K, V>>,
    /// Number of entries
    length: usize,
}

impl<K, V> PersistentCritBitMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map: PersistentCritBitMap<String, i32> = PersistentCritBitMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    const fn with_root(root: Option<NodeRef<K, V>>, length: usize) -> Self {
        Self { root, length }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both maps are the same version, i.e. share their
    /// root node (or are both empty).
    ///
    /// Operations that leave a map unchanged return a version for which this
    /// holds, without allocating.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new().insert("a".to_string(), 1);
    /// assert!(map.remove("missing").ptr_eq(&map));
    /// assert!(!map.insert("b".to_string(), 2).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns an iterator over entries in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map: PersistentCritBitMap<String, i32> =
    ///     [("b".to_string(), 2), ("a".to_string(), 1)].into_iter().collect();
    ///
    /// let entries: Vec<(&String, &i32)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&"a".to_string(), &1), (&"b".to_string(), &2)]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentCritBitMapIterator<'_, K, V> {
        let mut stack = SmallVec::new();
        if let Some(root) = &self.root {
            stack.push(&**root);
        }
        PersistentCritBitMapIterator {
            stack,
            remaining: self.length,
        }
    }

    /// Returns an iterator over keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: ByteKey, V> PersistentCritBitMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but its byte
    /// codes must match those of the key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new().insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and value corresponding to the key.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
    {
        self.root.as_ref()?.lookup(key)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Returns the leftmost or rightmost entry.
    #[must_use]
    pub fn extremity(&self, extremity: Extremity) -> Option<(&K, &V)> {
        self.root.as_ref().map(|root| root.extremity(extremity))
    }

    /// Returns the entry with the minimum key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new()
    ///     .insert("ab".to_string(), 2)
    ///     .insert("a".to_string(), 1);
    ///
    /// assert_eq!(map.min(), Some((&"a".to_string(), &1)));
    /// ```
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        self.extremity(Extremity::Leftmost)
    }

    /// Returns the entry with the maximum key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        self.extremity(Extremity::Rightmost)
    }

    /// Checks the structural invariants of the trie.
    ///
    /// # Errors
    ///
    /// Returns the first violation found. Maps whose keys honour the
    /// [`ByteKey`] contract always validate.
    pub fn validate(&self) -> Result<(), CritBitError> {
        let actual = check(self.root.as_ref())?;
        if actual == self.length {
            Ok(())
        } else {
            Err(CritBitError::LengthMismatch {
                expected: self.length,
                actual,
            })
        }
    }
}

impl<K: ByteKey + Clone, V: Clone> PersistentCritBitMap<K, V> {
    /// Creates a map containing a single key-value pair.
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::with_root(Some(Node::leaf(key, value)), 1)
    }

    /// Inserts a key-value pair, combining with the existing value if the key
    /// is already present, and returns the previous value with the new map.
    ///
    /// `combine` receives the key, the new value and the old value, and is
    /// only called when the key is present.
    ///
    /// # Complexity
    ///
    /// O(D + L). Only the nodes on the path to the entry are allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new()
    ///     .insert("a".to_string(), 5_usize)
    ///     .insert("b".to_string(), 3);
    ///
    /// let (previous, updated) =
    ///     map.insert_lookup_with("a".to_string(), 1, |key, new, old| key.len() + new + old);
    ///
    /// assert_eq!(previous, Some(5));
    /// assert_eq!(updated.get("a"), Some(&7));
    /// assert_eq!(updated.get("b"), Some(&3));
    /// ```
    #[must_use]
    pub fn insert_lookup_with<F>(&self, key: K, value: V, combine: F) -> (Option<V>, Self)
    where
        F: FnOnce(&K, V, &V) -> V,
    {
        let (previous, root) = insert_combine(self.root.as_ref(), key, value, combine);
        let length = if previous.is_some() {
            self.length
        } else {
            self.length + 1
        };
        (previous, Self::with_root(Some(root), length))
    }

    /// Inserts a key-value pair, combining with the existing value if the key
    /// is already present.
    #[must_use]
    pub fn insert_with<F>(&self, key: K, value: V, combine: F) -> Self
    where
        F: FnOnce(&K, V, &V) -> V,
    {
        self.insert_lookup_with(key, value, combine).1
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains the key, the value is replaced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map1 = PersistentCritBitMap::new().insert("k".to_string(), "one");
    /// let map2 = map1.insert("k".to_string(), "ONE");
    ///
    /// assert_eq!(map1.get("k"), Some(&"one")); // Original unchanged
    /// assert_eq!(map2.get("k"), Some(&"ONE")); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        self.insert_with(key, value, |_, new, _| new)
    }

    /// Inserts a key-value pair only if the key is not already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new().insert("k".to_string(), 1);
    /// assert_eq!(map.insert_if_absent("k".to_string(), 2).get("k"), Some(&1));
    /// assert_eq!(map.insert_if_absent("j".to_string(), 2).get("j"), Some(&2));
    /// ```
    #[must_use]
    pub fn insert_if_absent(&self, key: K, value: V) -> Self {
        self.insert_with(key, value, |_, _, old| old.clone())
    }

    /// Replaces or removes the entry for a key, and returns the previous value
    /// with the new map.
    ///
    /// `decide` receives the stored key and value; returning `Some` replaces
    /// the value, returning `None` removes the entry. It is not called when
    /// the key is absent, in which case the map is returned as is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new()
    ///     .insert("a".to_string(), 5)
    ///     .insert("b".to_string(), 3);
    ///
    /// let decide = |_: &String, value: &i32| (*value == 5).then(|| value + 1);
    /// let (previous, updated) = map.update_lookup_with("b", decide);
    ///
    /// assert_eq!(previous, Some(3));
    /// assert_eq!(updated.len(), 1);
    /// assert_eq!(updated.get("a"), Some(&5));
    /// ```
    #[must_use]
    pub fn update_lookup_with<Q, F>(&self, key: &Q, decide: F) -> (Option<V>, Self)
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let Some(root) = &self.root else {
            return (None, self.clone());
        };
        let (previous, rebuilt) = update_lookup(root, key, decide);
        let map = match rebuilt {
            Rebuilt::Unchanged => self.clone(),
            Rebuilt::Updated(root) => Self::with_root(Some(root), self.length),
            Rebuilt::Collapsed(root) => Self::with_root(Some(root), self.length - 1),
            Rebuilt::Removed => Self::new(),
        };
        (previous, map)
    }

    /// Applies `function` to the value of a key, if present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new().insert("count".to_string(), 10);
    /// assert_eq!(map.update("count", |value| value + 1).get("count"), Some(&11));
    /// assert!(map.update("other", |value| value + 1).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn update<Q, F>(&self, key: &Q, function: F) -> Self
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
        F: FnOnce(&V) -> V,
    {
        self.update_lookup_with(key, |_, value| Some(function(value))).1
    }

    /// Removes a key from the map, returning the removed value with the new
    /// map.
    #[must_use]
    pub fn remove_lookup<Q>(&self, key: &Q) -> (Option<V>, Self)
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
    {
        self.update_lookup_with(key, |_, _| None)
    }

    /// Removes a key from the map.
    ///
    /// Returns a new map without the key. If the key doesn't exist, the
    /// original map is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use critmap::persistent::PersistentCritBitMap;
    ///
    /// let map = PersistentCritBitMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let removed = map.remove("a");
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert_eq!(removed.get("a"), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
    {
        self.remove_lookup(key).1
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over key-value pairs of a [`PersistentCritBitMap`], in
/// ascending key order.
pub struct PersistentCritBitMapIterator<'a, K, V> {
    /// Subtrees still to visit; the next one is on top
    stack: SmallVec<[&'a Node<K, V>; INLINE_STACK_DEPTH]>,
    /// Entries not yet returned
    remaining: usize,
}

impl<'a, K, V> Iterator for PersistentCritBitMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let mut node = self.stack.pop()?;
        loop {
            match node {
                Node::Leaf { key, value } => {
                    self.remaining -= 1;
                    return Some((key, value));
                }
                Node::Internal(branch) => {
                    self.stack.push(&*branch.right);
                    node = &*branch.left;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentCritBitMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over key-value pairs of a [`PersistentCritBitMap`].
pub struct PersistentCritBitMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentCritBitMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentCritBitMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Clone for PersistentCritBitMap<K, V> {
    fn clone(&self) -> Self {
        Self::with_root(self.root.clone(), self.length)
    }
}

impl<K, V> Default for PersistentCritBitMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ByteKey + Clone, V: Clone> FromIterator<(K, V)> for PersistentCritBitMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (key, value)| map.insert(key, value))
    }
}

impl<K: Clone, V: Clone> IntoIterator for PersistentCritBitMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentCritBitMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        PersistentCritBitMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentCritBitMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentCritBitMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for PersistentCritBitMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        // Both sides iterate in key order
        self.length == other.length
            && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq> Eq for PersistentCritBitMap<K, V> {}

/// Hashes the length, then every entry in key order, so that equal maps
/// hash equally regardless of how they were built.
impl<K: Hash, V: Hash> Hash for PersistentCritBitMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentCritBitMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for PersistentCritBitMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentCritBitMap<String, i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentCritBitMap<String, i32>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for PersistentCritBitMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentCritBitMapVisitor<K, V> {
    marker: std::marker::PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentCritBitMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + ByteKey + Clone,
    V: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentCritBitMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentCritBitMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map = map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentCritBitMap<K, V>
where
    K: serde::Deserialize<'de> + ByteKey + Clone,
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentCritBitMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Multithread Tests (arc feature only)
// =============================================================================
