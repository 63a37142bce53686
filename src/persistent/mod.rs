//! Persistent (immutable) data structures.
//!
//! This module provides [`PersistentCritBitMap`], an ordered map over
//! byte-comparable keys that uses structural sharing to minimize copying.
//!
//! # Structural Sharing
//!
//! Writes create new versions of the map without copying the entire
//! structure: only the nodes on the path to the modified entry are rebuilt.
//!
//! # Examples
//!
//! ```rust
//! use critmap::persistent::PersistentCritBitMap;
//!
//! let map = PersistentCritBitMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//! assert_eq!(map.get("one"), Some(&1));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//!
//! // Entries come back in byte order
//! let keys: Vec<&String> = updated.keys().collect();
//! assert_eq!(keys, vec!["one", "two"]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod critbit;

pub use critbit::ByteKey;
pub use critbit::CritBitError;
pub use critbit::END_OF_KEY;
pub use critbit::Extremity;
pub use critbit::PersistentCritBitMap;
pub use critbit::PersistentCritBitMapIntoIterator;
pub use critbit::PersistentCritBitMapIterator;
pub use critbit::byte_code_at;

// =============================================================================
// Tests
// =============================================================================
