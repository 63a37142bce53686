//! Trie nodes, lookup and extremity traversal.

use std::borrow::Borrow;

use smallvec::SmallVec;

use crate::persistent::ReferenceCounter;

use super::bits::{CriticalBit, Direction};
use super::key::ByteKey;

/// Shared handle to a node. Clones are shallow.
pub(crate) type NodeRef<K, V> = ReferenceCounter<Node<K, V>>;

/// Number of path frames kept inline before spilling to the heap.
pub(crate) const INLINE_PATH_DEPTH: usize = 32;

/// The internal nodes passed from the root down to a leaf, each with the
/// side that was taken. Critical bits strictly increase along a path.
pub(crate) type Path<'a, K, V> =
    SmallVec<[(&'a Branch<K, V>, Direction); INLINE_PATH_DEPTH]>;

// =============================================================================
// Node Definition
// =============================================================================

/// A node of a non-empty trie.
///
/// There is no empty variant: an empty map has no root, and an internal node
/// always owns two live subtrees.
pub(crate) enum Node<K, V> {
    /// A single entry.
    Leaf { key: K, value: V },
    /// A two-way split on a critical bit.
    Internal(Branch<K, V>),
}

/// An internal node.
pub(crate) struct Branch<K, V> {
    pub(crate) critical: CriticalBit,
    pub(crate) left: NodeRef<K, V>,
    pub(crate) right: NodeRef<K, V>,
}

/// Which end of the key order to walk to.
///
/// # Examples
///
/// ```rust
/// use critmap::persistent::{Extremity, PersistentCritBitMap};
///
/// let map: PersistentCritBitMap<String, i32> =
///     [("b".to_string(), 2), ("a".to_string(), 1)].into_iter().collect();
///
/// assert_eq!(map.extremity(Extremity::Leftmost), Some((&"a".to_string(), &1)));
/// assert_eq!(map.extremity(Extremity::Rightmost), Some((&"b".to_string(), &2)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Extremity {
    /// The entry with the smallest key.
    Leftmost,
    /// The entry with the largest key.
    Rightmost,
}

impl Extremity {
    const fn direction(self) -> Direction {
        match self {
            Self::Leftmost => Direction::Left,
            Self::Rightmost => Direction::Right,
        }
    }
}

impl<K, V> Branch<K, V> {
    /// Creates an internal node from its two children.
    pub(crate) const fn new(
        critical: CriticalBit,
        left: NodeRef<K, V>,
        right: NodeRef<K, V>,
    ) -> Self {
        Self {
            critical,
            left,
            right,
        }
    }

    /// Places `child` on the `direction` side and `other` on the opposite one.
    pub(crate) fn ordered(
        critical: CriticalBit,
        direction: Direction,
        child: NodeRef<K, V>,
        other: NodeRef<K, V>,
    ) -> Self {
        match direction {
            Direction::Left => Self::new(critical, child, other),
            Direction::Right => Self::new(critical, other, child),
        }
    }

    /// Direction of `key` at this node.
    #[inline]
    pub(crate) fn direction_of<Q: ByteKey + ?Sized>(&self, key: &Q) -> Direction {
        self.critical.direction_of(key)
    }

    #[inline]
    pub(crate) const fn child(&self, direction: Direction) -> &NodeRef<K, V> {
        match direction {
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }

    #[inline]
    pub(crate) const fn sibling(&self, direction: Direction) -> &NodeRef<K, V> {
        match direction {
            Direction::Left => &self.right,
            Direction::Right => &self.left,
        }
    }

    /// Copies this node with the `direction` child replaced. The other child
    /// is shared.
    pub(crate) fn with_child(&self, direction: Direction, child: NodeRef<K, V>) -> Self {
        Self::ordered(
            self.critical,
            direction,
            child,
            self.sibling(direction).clone(),
        )
    }
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn leaf(key: K, value: V) -> NodeRef<K, V> {
        ReferenceCounter::new(Self::Leaf { key, value })
    }

    #[inline]
    pub(crate) fn internal(branch: Branch<K, V>) -> NodeRef<K, V> {
        ReferenceCounter::new(Self::Internal(branch))
    }

    /// Finds the entry stored under `key`.
    ///
    /// Branching only narrows the search to one candidate leaf, so the
    /// candidate's key is compared in full before it is returned.
    pub(crate) fn lookup<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ByteKey + ?Sized,
    {
        let (leaf_key, value) = self.anchor(key);
        (<K as Borrow<Q>>::borrow(leaf_key) == key).then_some((leaf_key, value))
    }

    /// Follows the branch decisions for `key` down to a leaf, whether or not
    /// that leaf holds `key`.
    pub(crate) fn anchor<Q: ByteKey + ?Sized>(&self, key: &Q) -> (&K, &V) {
        let mut node = self;
        loop {
            match node {
                Self::Leaf {
                    key: leaf_key,
                    value,
                } => return (leaf_key, value),
                Self::Internal(branch) => node = &**branch.child(branch.direction_of(key)),
            }
        }
    }

    /// Walks to the leftmost or rightmost leaf of this subtree.
    pub(crate) fn extremity(&self, extremity: Extremity) -> (&K, &V) {
        let direction = extremity.direction();
        let mut node = self;
        loop {
            match node {
                Self::Leaf { key, value } => return (key, value),
                Self::Internal(branch) => node = &**branch.child(direction),
            }
        }
    }
}

// =============================================================================
// Path Copying
// =============================================================================

/// Follows the branch decisions for `key` from `root` down to a leaf and
/// returns the path taken together with that leaf's entry.
///
/// The leaf is the only candidate for `key`; it holds `key` only if the
/// caller's comparison says so.
pub(crate) fn descend<'a, K, V, Q>(
    root: &'a NodeRef<K, V>,
    key: &Q,
) -> (Path<'a, K, V>, &'a K, &'a V)
where
    Q: ByteKey + ?Sized,
{
    let mut path = Path::new();
    let mut node = root;
    loop {
        match &**node {
            Node::Leaf {
                key: leaf_key,
                value,
            } => return (path, leaf_key, value),
            Node::Internal(branch) => {
                let direction = branch.direction_of(key);
                path.push((branch, direction));
                node = branch.child(direction);
            }
        }
    }
}

/// Copies every node of `path` bottom-up around `child`, which replaces the
/// subtree the path ends at. Siblings off the path are shared.
pub(crate) fn rebuild<K, V>(
    path: &[(&Branch<K, V>, Direction)],
    child: NodeRef<K, V>,
) -> NodeRef<K, V> {
    path.iter().rev().fold(child, |child, &(branch, direction)| {
        Node::internal(branch.with_child(direction, child))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::critbit::bits::divergence;
    use rstest::rstest;

    fn pair(left: &'static str, right: &'static str) -> NodeRef<&'static str, i32> {
        let critical = divergence(0, left, right).critical;
        Node::internal(Branch::new(
            critical,
            Node::leaf(left, 1),
            Node::leaf(right, 2),
        ))
    }

    #[rstest]
    fn test_lookup_compares_full_key() {
        let node = pair("abc", "abd");
        assert_eq!(node.lookup("abc"), Some((&"abc", &1)));
        assert_eq!(node.lookup("abd"), Some((&"abd", &2)));
        // "xbc" takes the same branches as "abc" but is a different key
        assert_eq!(node.lookup("xbc"), None);
        assert_eq!(node.anchor("xbc").0, &"abc");
    }

    #[rstest]
    fn test_extremity_of_pair() {
        let node = pair("a", "ab");
        assert_eq!(node.extremity(Extremity::Leftmost), (&"a", &1));
        assert_eq!(node.extremity(Extremity::Rightmost), (&"ab", &2));
    }

    #[rstest]
    fn test_extremity_of_leaf_is_itself() {
        let node = Node::leaf("only", 7);
        assert_eq!(node.extremity(Extremity::Leftmost), (&"only", &7));
        assert_eq!(node.extremity(Extremity::Rightmost), (&"only", &7));
    }

    #[rstest]
    fn test_with_child_shares_sibling() {
        let root = pair("a", "b");
        let Node::Internal(branch) = &*root else {
            unreachable!("pair builds an internal node");
        };
        let replaced = branch.with_child(Direction::Left, Node::leaf("A", 9));
        assert!(ReferenceCounter::ptr_eq(&replaced.right, &branch.right));
        assert!(!ReferenceCounter::ptr_eq(&replaced.left, &branch.left));
    }

    #[rstest]
    fn test_descend_records_sides_taken() {
        let lower = pair("ab", "ac");
        let critical = divergence(0, "ab", "b").critical;
        let root = Node::internal(Branch::new(critical, lower, Node::leaf("b", 3)));

        let (path, key, value) = descend(&root, "ac");
        assert_eq!((key, value), (&"ac", &2));
        let sides: Vec<Direction> = path.iter().map(|&(_, side)| side).collect();
        assert_eq!(sides, vec![Direction::Left, Direction::Right]);

        let (path, key, _) = descend(&root, "zz");
        assert_eq!(key, &"b");
        assert_eq!(path.len(), 1);
    }

    #[rstest]
    fn test_rebuild_copies_path_and_shares_siblings() {
        let lower = pair("ab", "ac");
        let critical = divergence(0, "ab", "b").critical;
        let root = Node::internal(Branch::new(critical, lower, Node::leaf("b", 3)));

        let (path, _, _) = descend(&root, "ab");
        let rebuilt = rebuild(&path, Node::leaf("ab", 10));
        assert_eq!(rebuilt.lookup("ab"), Some((&"ab", &10)));
        assert_eq!(root.lookup("ab"), Some((&"ab", &1)));

        let (Node::Internal(before), Node::Internal(after)) = (&*root, &*rebuilt) else {
            unreachable!("both roots are internal");
        };
        assert!(ReferenceCounter::ptr_eq(&before.right, &after.right));
        assert!(!ReferenceCounter::ptr_eq(&before.left, &after.left));
    }

    #[rstest]
    fn test_rebuild_empty_path_returns_child() {
        let child = Node::leaf("only", 1);
        let rebuilt = rebuild(&[], child.clone());
        assert!(ReferenceCounter::ptr_eq(&rebuilt, &child));
    }
}
