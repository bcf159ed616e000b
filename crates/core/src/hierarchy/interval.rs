//! Interval index: containment tests on nested-set bounds.
//!
//! `B` is a descendant of `A` iff `A.left < B.left && B.right < A.right`.
//! No parent pointers are followed here.

use serde::Serialize;

use crate::domain::{AlbumId, AlbumNode};

/// The `(left, right)` bounds of one node. Always `left < right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Interval {
    pub left: u64,
    pub right: u64,
}

impl Interval {
    /// Returns `None` unless `left < right`.
    pub fn new(left: u64, right: u64) -> Option<Self> {
        (left < right).then_some(Self { left, right })
    }

    /// A two-wide interval starting at `left`, the shape of every new node.
    pub fn leaf(left: u64) -> Self {
        Self {
            left,
            right: left + 1,
        }
    }

    /// Number of bounds covered, `right - left + 1`. Always even in a valid tree.
    pub fn width(&self) -> u64 {
        self.right - self.left + 1
    }

    pub fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }

    /// Strict containment: `other` lies inside `self` and is not `self`.
    pub fn strictly_contains(&self, other: &Interval) -> bool {
        self.left < other.left && other.right < self.right
    }

    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.right < other.left || other.right < self.left
    }

    /// Partial overlap, the one relation a valid tree never has.
    pub fn partially_overlaps(&self, other: &Interval) -> bool {
        (self.left < other.left && other.left < self.right && self.right < other.right)
            || (other.left < self.left && self.left < other.right && other.right < self.right)
    }

    /// Whether an item at `position` (its album's `left`) falls in this subtree.
    pub fn covers_position(&self, position: u64) -> bool {
        self.left <= position && position < self.right
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.left, self.right)
    }
}

/// Returns true iff `candidate` lies strictly inside `ancestor`.
pub fn is_descendant(candidate: &Interval, ancestor: &Interval) -> bool {
    ancestor.strictly_contains(candidate)
}

/// A node placed in the hierarchy.
pub trait HierarchyNode {
    fn node_id(&self) -> AlbumId;
    fn parent(&self) -> Option<AlbumId>;
    fn bounds(&self) -> Interval;

    fn is_descendant_of<N: HierarchyNode + ?Sized>(&self, other: &N) -> bool {
        is_descendant(&self.bounds(), &other.bounds())
    }

    fn is_ancestor_of<N: HierarchyNode + ?Sized>(&self, other: &N) -> bool {
        is_descendant(&other.bounds(), &self.bounds())
    }

    /// Same parent, different node. Roots are siblings of each other.
    fn is_sibling_of<N: HierarchyNode + ?Sized>(&self, other: &N) -> bool {
        self.node_id() != other.node_id() && self.parent() == other.parent()
    }

    /// Range covering this node and everything under it.
    fn subtree_range(&self) -> Interval {
        self.bounds()
    }
}

impl HierarchyNode for AlbumNode {
    fn node_id(&self) -> AlbumId {
        self.id
    }

    fn parent(&self) -> Option<AlbumId> {
        self.parent_id
    }

    fn bounds(&self) -> Interval {
        self.interval
    }
}
