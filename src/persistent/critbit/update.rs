//! The update/delete-and-lookup engine.

use std::borrow::Borrow;

use super::key::ByteKey;
use super::node::{Node, NodeRef, descend, rebuild};

/// How a subtree changed during an update.
pub(crate) enum Rebuilt<K, V> {
    /// Nothing matched; the original subtree stands as it was.
    Unchanged,
    /// A value was replaced; the subtree was copied along the path.
    Updated(NodeRef<K, V>),
    /// An entry below was deleted and its parent folded into the sibling.
    Collapsed(NodeRef<K, V>),
    /// The subtree was a single leaf and is gone.
    Removed,
}

/// Looks `key` up and lets `decide` replace or delete its entry.
///
/// `decide` is only called when the key is present. Returning `Some` stores
/// the new value, returning `None` deletes the entry. The previous value is
/// returned alongside the rebuilt root. An absent key leaves the trie
/// untouched and allocates nothing.
///
/// The path is recorded on the way down and copied bottom-up afterwards, so
/// deep tries do not deepen the call stack.
pub(crate) fn update_lookup<K, V, Q, F>(
    root: &NodeRef<K, V>,
    key: &Q,
    decide: F,
) -> (Option<V>, Rebuilt<K, V>)
where
    K: Borrow<Q> + Clone,
    V: Clone,
    Q: ByteKey + ?Sized,
    F: FnOnce(&K, &V) -> Option<V>,
{
    let (mut path, leaf_key, value) = descend(root, key);
    if <K as Borrow<Q>>::borrow(leaf_key) != key {
        return (None, Rebuilt::Unchanged);
    }

    let previous = value.clone();
    let rebuilt = match decide(leaf_key, value) {
        Some(replacement) => {
            Rebuilt::Updated(rebuild(&path, Node::leaf(leaf_key.clone(), replacement)))
        }
        None => match path.pop() {
            None => Rebuilt::Removed,
            Some((parent, direction)) => {
                tracing::trace!(
                    offset = parent.critical.offset(),
                    mask = parent.critical.mask(),
                    depth = path.len(),
                    "collapsing internal node into its sibling"
                );
                Rebuilt::Collapsed(rebuild(&path, parent.sibling(direction).clone()))
            }
        },
    };
    (Some(previous), rebuilt)
}
