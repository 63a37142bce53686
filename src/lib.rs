//! # critmap
//!
//! A persistent (immutable) ordered map for byte-comparable keys, built on a
//! crit-bit trie with structural sharing.
//!
//! ## Overview
//!
//! Every write returns a new map and leaves the original untouched. Only the
//! nodes on the modified root-to-leaf path are allocated; every other subtree
//! is shared between the old and the new version.
//!
//! - **Keys**: anything implementing [`ByteKey`](persistent::ByteKey), i.e. a
//!   key that can be read as a sequence of bytes and orders like one
//! - **Lookup**: follows one bit decision per internal node, then compares the
//!   candidate leaf in full
//! - **Writes**: combine-on-insert and update-or-delete engines that also
//!   return the previous value
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes through `Arc` so maps are `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for
//!   [`PersistentCritBitMap`](persistent::PersistentCritBitMap)
//!
//! ## Example
//!
//! ```rust
//! use critmap::prelude::*;
//!
//! let map = PersistentCritBitMap::new()
//!     .insert("b".to_string(), 2)
//!     .insert("a".to_string(), 1);
//!
//! assert_eq!(map.get("a"), Some(&1));
//! assert_eq!(map.min(), Some((&"a".to_string(), &1)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use critmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
