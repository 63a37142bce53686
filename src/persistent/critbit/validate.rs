//! Structural validation of a crit-bit trie.

use thiserror::Error;

use super::bits::{CriticalBit, Direction};
use super::key::ByteKey;
use super::node::{Node, NodeRef};

/// A violated structural invariant, reported by
/// [`PersistentCritBitMap::validate`](super::PersistentCritBitMap::validate).
///
/// A map built only through this crate's operations never produces one of
/// these; seeing one means a [`ByteKey`] implementation broke its contract
/// or the trie itself is defective.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CritBitError {
    /// An internal node's mask does not single out exactly one bit.
    #[error("Malformed critical-bit mask {mask:#011b} at byte offset {offset}")]
    MalformedMask {
        /// Byte offset of the offending node.
        offset: usize,
        /// The mask found there.
        mask: u16,
    },

    /// An internal node does not split strictly after its parent.
    #[error(
        "Critical bit (offset {offset}, mask {mask:#011b}) does not refine its parent \
         (offset {parent_offset}, mask {parent_mask:#011b})"
    )]
    UnorderedCriticalBit {
        /// Byte offset of the child node.
        offset: usize,
        /// Mask of the child node.
        mask: u16,
        /// Byte offset of the parent node.
        parent_offset: usize,
        /// Mask of the parent node.
        parent_mask: u16,
    },

    /// A key sits on the side of an ancestor its bits do not lead to.
    #[error("Key stored on the wrong side of the node at byte offset {offset}")]
    MisplacedKey {
        /// Byte offset of the ancestor the key disagrees with.
        offset: usize,
    },

    /// The cached entry count differs from the number of leaves.
    #[error("Cached length {expected} does not match the {actual} entries in the trie")]
    LengthMismatch {
        /// The length the map reports.
        expected: usize,
        /// The number of leaves found.
        actual: usize,
    },
}

/// Checks every invariant below `root` and returns the number of entries.
///
/// Subtrees still to visit are kept on an explicit stack together with the
/// length of the path above them, so deep tries do not deepen the call stack.
pub(crate) fn check<K: ByteKey, V>(root: Option<&NodeRef<K, V>>) -> Result<usize, CritBitError> {
    let Some(root) = root else {
        return Ok(0);
    };

    let mut path: Vec<(CriticalBit, Direction)> = Vec::new();
    let mut pending: Vec<(&Node<K, V>, Option<(CriticalBit, Direction)>, usize)> =
        vec![(&**root, None, 0)];
    let mut count = 0;

    while let Some((node, edge, depth)) = pending.pop() {
        path.truncate(depth);
        path.extend(edge);

        match node {
            Node::Leaf { key, .. } => {
                for &(critical, side) in &path {
                    if critical.direction_of(key) != side {
                        return Err(CritBitError::MisplacedKey {
                            offset: critical.offset(),
                        });
                    }
                }
                count += 1;
            }
            Node::Internal(branch) => {
                let critical = branch.critical;
                if !critical.is_well_formed() {
                    return Err(CritBitError::MalformedMask {
                        offset: critical.offset(),
                        mask: critical.mask(),
                    });
                }
                if let Some(&(parent, _)) = path.last()
                    && parent >= critical
                {
                    return Err(CritBitError::UnorderedCriticalBit {
                        offset: critical.offset(),
                        mask: critical.mask(),
                        parent_offset: parent.offset(),
                        parent_mask: parent.mask(),
                    });
                }
                // Right first, so the left subtree is checked first
                for side in [Direction::Right, Direction::Left] {
                    pending.push((&**branch.child(side), Some((critical, side)), path.len()));
                }
            }
        }
    }
    Ok(count)
}
