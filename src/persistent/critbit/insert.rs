//! The insert-and-combine engine.
//!
//! Inserting walks the trie once, following the new key's branch decisions
//! down to an anchor leaf and recording the path. If the anchor holds the
//! same key its value is combined in place. Otherwise the anchor reveals the
//! critical bit of the new key, and a fresh internal node is spliced in above
//! the first node on the path whose critical bit comes after it. In both
//! cases the path above the change is copied bottom-up from the recorded
//! frames, so the call stack stays flat however deep the trie is.

use super::bits::{Divergence, divergence};
use super::key::ByteKey;
use super::node::{Branch, Node, NodeRef, descend, rebuild};

/// Inserts `key`, combining with the existing value when the key is present.
///
/// `combine` receives the key, the new value and the old value. Returns the
/// old value, if any, and the new root. Nodes off the modified path are
/// shared with `root`.
pub(crate) fn insert_combine<K, V, F>(
    root: Option<&NodeRef<K, V>>,
    key: K,
    value: V,
    combine: F,
) -> (Option<V>, NodeRef<K, V>)
where
    K: ByteKey,
    V: Clone,
    F: FnOnce(&K, V, &V) -> V,
{
    let Some(root) = root else {
        return (None, Node::leaf(key, value));
    };

    let (mut path, anchor_key, anchor_value) = descend(root, &key);
    if *anchor_key == key {
        let previous = anchor_value.clone();
        let combined = combine(&key, value, anchor_value);
        tracing::trace!(depth = path.len(), "combining with the value of an existing entry");
        return (Some(previous), rebuild(&path, Node::leaf(key, combined)));
    }

    let Divergence { critical, code } = divergence(0, &key, anchor_key);

    // The new node goes above the first branch that splits later than it.
    let depth = path.partition_point(|(branch, _)| branch.critical < critical);
    debug_assert!(
        path.get(depth).is_none_or(|(branch, _)| branch.critical != critical),
        "a new key cannot rediscover a critical bit on its own path"
    );
    let subtree = depth
        .checked_sub(1)
        .and_then(|parent| path.get(parent))
        .map_or(root, |&(branch, direction)| branch.child(direction));
    tracing::trace!(
        offset = critical.offset(),
        mask = critical.mask(),
        depth,
        "splicing a new internal node"
    );

    let spliced = Node::internal(Branch::ordered(
        critical,
        critical.direction(code),
        subtree.clone(),
        Node::leaf(key, value),
    ));
    path.truncate(depth);
    (None, rebuild(&path, spliced))
}
