//! Persistent (immutable) ordered map based on a crit-bit trie.
//!
//! This module provides [`PersistentCritBitMap`], an immutable map over
//! byte-comparable keys that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! A crit-bit trie is a compressed binary trie: each internal node records the
//! first bit at which the keys of its two subtrees differ, and nothing else.
//!
//! - O(min(depth, key length)) get
//! - O(key length + depth) insert, update and remove
//! - O(depth) min/max
//! - O(1) len and `is_empty`
//!
//! # Internal Structure
//!
//! Keys are read through [`ByteKey::byte_code`], which maps every position to
//! a 9-bit code: `0` past the end of the key, `256 + byte` otherwise. Internal
//! nodes store a byte offset and a mask with every bit set except the
//! critical one, so a branch decision is a single `or`, `add` and `shift`.
//!
//! The trie maintains the following invariants:
//! 1. Keys are unique
//! 2. Every key under the left child of an internal node has direction 0 at
//!    that node, every key under the right child has direction 1
//! 3. `(offset, mask)` strictly increases along every root-to-leaf path
//! 4. Internal nodes have exactly two non-empty children
//!
//! The empty trie is represented by the absence of a root, so invariant 4
//! holds by construction.

mod bits;
mod insert;
mod key;
mod map;
mod node;
mod update;
mod validate;

pub use key::{ByteKey, END_OF_KEY, byte_code_at};
pub use map::{PersistentCritBitMap, PersistentCritBitMapIntoIterator, PersistentCritBitMapIterator};
pub use node::Extremity;
pub use validate::CritBitError;
