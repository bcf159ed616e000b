//! Structural changes to the album tree.
//!
//! Every change is a [`Renumbering`]: a few range shifts applied to all
//! bounds at once. The operations are written against [`IntervalStore`] so
//! the same code drives the in-memory [`Forest`](super::forest::Forest) and
//! the SQLite catalog.

use tracing::debug;

use super::interval::{HierarchyNode, Interval};
use crate::domain::{AlbumId, AlbumNode};
use crate::error::{Error, Result};

/// Add `delta` to every bound in `from..=to` (`to: None` means unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub from: u64,
    pub to: Option<u64>,
    pub delta: i64,
}

impl Shift {
    pub fn matches(&self, bound: u64) -> bool {
        bound >= self.from && self.to.map_or(true, |to| bound <= to)
    }
}

/// A set of shifts applied simultaneously. Each bound is matched against its
/// value before the update; the first matching shift wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renumbering {
    pub shifts: Vec<Shift>,
}

impl Renumbering {
    fn push(&mut self, from: u64, to: Option<u64>, delta: i64) {
        let empty_range = to.is_some_and(|to| to < from);
        if delta != 0 && !empty_range {
            self.shifts.push(Shift { from, to, delta });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// New value of `bound` under this plan.
    pub fn apply(&self, bound: u64) -> Result<u64> {
        match self.shifts.iter().find(|s| s.matches(bound)) {
            Some(shift) => bound.checked_add_signed(shift.delta).ok_or_else(|| {
                Error::ConsistencyViolation(format!(
                    "bound {bound} shifted by {} leaves the valid range",
                    shift.delta
                ))
            }),
            None => Ok(bound),
        }
    }

    /// Whether any bound of `interval` would move.
    pub fn touches(&self, interval: &Interval) -> bool {
        self.shifts
            .iter()
            .any(|s| s.matches(interval.left) || s.matches(interval.right))
    }
}

/// Open a two-wide gap at `pos`.
pub fn plan_insert(pos: u64) -> Renumbering {
    let mut plan = Renumbering::default();
    plan.push(pos, None, 2);
    plan
}

/// Close the gap left behind by removing `block`.
pub fn plan_remove(block: Interval) -> Renumbering {
    let mut plan = Renumbering::default();
    plan.push(block.right + 1, None, -(block.width() as i64));
    plan
}

/// Relocate `block` so it ends right before the bound currently at `pos`.
///
/// `pos` must lie outside `block`. Equivalent to removing the block and
/// inserting it at `pos`, but done as one update so no intermediate state
/// exists.
pub fn plan_move(block: Interval, pos: u64) -> Renumbering {
    let width = block.width() as i64;
    let mut plan = Renumbering::default();
    if pos > block.right {
        plan.push(block.left, Some(block.right), (pos - 1 - block.right) as i64);
        plan.push(block.right + 1, Some(pos - 1), -width);
    } else {
        plan.push(block.left, Some(block.right), -((block.left - pos) as i64));
        plan.push(pos, Some(block.left - 1), width);
    }
    plan
}

/// Storage that holds album rows and lets the mutator rewrite their bounds.
///
/// Implementations must apply each call atomically; callers group calls
/// into one transaction (`Catalog::write`, `Forest::transaction`) so a failed
/// operation leaves nothing behind.
pub trait IntervalStore {
    fn node(&self, id: AlbumId) -> Result<AlbumNode>;

    /// Largest `right` bound in the store, 0 when empty.
    fn max_right(&self) -> Result<u64>;

    /// Apply a plan to every row. Returns the number of rows changed.
    fn renumber(&mut self, plan: &Renumbering) -> Result<usize>;

    fn create(
        &mut self,
        parent_id: Option<AlbumId>,
        interval: Interval,
        title: &str,
    ) -> Result<AlbumId>;

    /// Remove every row whose interval lies within `range` (inclusive).
    fn remove_range(&mut self, range: Interval) -> Result<usize>;

    fn set_parent(&mut self, id: AlbumId, parent_id: Option<AlbumId>) -> Result<()>;

    /// Check the tree invariants, failing with `ConsistencyViolation`.
    fn verify(&self) -> Result<()>;
}

/// Insert a new album as the rightmost child of `parent_id`, or as the
/// rightmost root.
pub fn insert<S: IntervalStore + ?Sized>(
    store: &mut S,
    parent_id: Option<AlbumId>,
    title: &str,
) -> Result<AlbumId> {
    if title.trim().is_empty() {
        return Err(Error::EmptyTitle);
    }

    let pos = match parent_id {
        Some(parent_id) => store.node(parent_id)?.interval.right,
        None => store.max_right()? + 1,
    };

    let plan = plan_insert(pos);
    let shifted = store.renumber(&plan)?;
    let id = store.create(parent_id, Interval::leaf(pos), title)?;
    debug!(album = id, ?parent_id, pos, shifted, "inserted album");

    store.verify()?;
    Ok(id)
}

/// Re-parent `id` (with its whole subtree) as the rightmost child of
/// `new_parent`, or as the rightmost root.
pub fn move_subtree<S: IntervalStore + ?Sized>(
    store: &mut S,
    id: AlbumId,
    new_parent: Option<AlbumId>,
) -> Result<()> {
    let node = store.node(id)?;

    let pos = match new_parent {
        Some(parent_id) => {
            let parent = store.node(parent_id)?;
            if parent_id == id || parent.is_descendant_of(&node) {
                return Err(Error::Cycle {
                    album: id,
                    new_parent: parent_id,
                });
            }
            parent.interval.right
        }
        None => store.max_right()? + 1,
    };

    let plan = plan_move(node.interval, pos);
    let shifted = store.renumber(&plan)?;
    if node.parent_id != new_parent {
        store.set_parent(id, new_parent)?;
    }
    debug!(album = id, ?new_parent, width = node.interval.width(), shifted, "moved album");

    store.verify()
}

/// Remove `id` and all its descendants, then compact the freed range.
/// Returns the number of albums removed.
pub fn delete_subtree<S: IntervalStore + ?Sized>(store: &mut S, id: AlbumId) -> Result<usize> {
    let node = store.node(id)?;

    let removed = store.remove_range(node.interval)?;
    let shifted = store.renumber(&plan_remove(node.interval))?;
    debug!(album = id, removed, shifted, "deleted album subtree");

    store.verify()?;
    Ok(removed)
}
