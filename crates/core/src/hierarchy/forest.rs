//! In-memory arena of album nodes addressed by id.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::error;

use super::aggregate::{self, Aggregatable};
use super::interval::{is_descendant, HierarchyNode, Interval};
use super::mutator::{self, IntervalStore, Renumbering};
use super::path;
use crate::domain::{AlbumId, AlbumNode, PhotoItem, TakenAtRange, TreeErrors};
use crate::error::{Error, Result};

/// A snapshot of the whole album tree. Parent/child relations are plain ids
/// resolved through this index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    nodes: BTreeMap<AlbumId, AlbumNode>,
    next_id: AlbumId,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Build from existing rows. New ids start after the largest id present;
    /// use [`Forest::with_next_id`] when ids above it were handed out before.
    pub fn from_nodes(nodes: impl IntoIterator<Item = AlbumNode>) -> Self {
        let nodes: BTreeMap<AlbumId, AlbumNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let next_id = nodes.keys().next_back().map_or(1, |id| id + 1);
        Self { nodes, next_id }
    }

    /// Never hand out an id below `next_id`.
    pub fn with_next_id(mut self, next_id: AlbumId) -> Self {
        self.next_id = self.next_id.max(next_id);
        self
    }

    /// Run `op` as one unit: if it fails, the forest is put back exactly as
    /// it was before the call.
    pub fn transaction<T>(&mut self, op: impl FnOnce(&mut Forest) -> Result<T>) -> Result<T> {
        let before = self.clone();
        let result = op(self);
        if result.is_err() {
            *self = before;
        }
        result
    }

    pub fn insert_album(&mut self, parent_id: Option<AlbumId>, title: &str) -> Result<AlbumId> {
        self.transaction(|forest| mutator::insert(forest, parent_id, title))
    }

    pub fn move_album(&mut self, id: AlbumId, new_parent: Option<AlbumId>) -> Result<()> {
        self.transaction(|forest| mutator::move_subtree(forest, id, new_parent))
    }

    pub fn delete_album(&mut self, id: AlbumId) -> Result<usize> {
        self.transaction(|forest| mutator::delete_subtree(forest, id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, id: AlbumId) -> Option<&AlbumNode> {
        self.nodes.get(&id)
    }

    pub fn get(&self, id: AlbumId) -> Result<&AlbumNode> {
        self.find(id).ok_or(Error::NotFound(id))
    }

    /// All nodes in pre-order (ascending `left`).
    pub fn nodes_in_order(&self) -> Vec<&AlbumNode> {
        let mut nodes: Vec<&AlbumNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| (n.interval.left, n.id));
        nodes
    }

    /// Pre-order nodes paired with their depth, in a single pass.
    pub fn nodes_with_depth(&self) -> Vec<(&AlbumNode, usize)> {
        let mut open: Vec<&AlbumNode> = Vec::new();
        self.nodes_in_order()
            .into_iter()
            .map(|node| {
                while open.last().is_some_and(|top| !node.is_descendant_of(*top)) {
                    open.pop();
                }
                let depth = open.len();
                open.push(node);
                (node, depth)
            })
            .collect()
    }

    /// Id → interval, for comparing layouts.
    pub fn intervals(&self) -> BTreeMap<AlbumId, Interval> {
        self.nodes.iter().map(|(id, n)| (*id, n.interval)).collect()
    }

    pub fn roots(&self) -> Vec<&AlbumNode> {
        self.select(|n| n.parent_id.is_none())
    }

    pub fn children(&self, id: AlbumId) -> Result<Vec<&AlbumNode>> {
        self.get(id)?;
        Ok(self.select(|n| n.parent_id == Some(id)))
    }

    /// Ancestors from the root down to the direct parent.
    pub fn ancestors(&self, id: AlbumId) -> Result<Vec<&AlbumNode>> {
        let node = self.get(id)?;
        Ok(self.select(|n| node.is_descendant_of(n)))
    }

    pub fn descendants(&self, id: AlbumId) -> Result<Vec<&AlbumNode>> {
        let node = self.get(id)?;
        Ok(self.select(|n| n.is_descendant_of(node)))
    }

    pub fn siblings(&self, id: AlbumId) -> Result<Vec<&AlbumNode>> {
        let node = self.get(id)?;
        Ok(self.select(|n| n.is_sibling_of(node)))
    }

    pub fn depth(&self, id: AlbumId) -> Result<usize> {
        Ok(self.ancestors(id)?.len())
    }

    pub fn is_descendant(&self, candidate: AlbumId, ancestor: AlbumId) -> Result<bool> {
        let candidate = self.get(candidate)?;
        let ancestor = self.get(ancestor)?;
        Ok(is_descendant(&candidate.interval, &ancestor.interval))
    }

    pub fn full_path(&self, id: AlbumId, separator: &str) -> Result<String> {
        let node = self.get(id)?;
        path::full_path(node, separator, |parent_id| Ok(self.find(parent_id)))
    }

    /// Earliest/latest `taken_at` among `photos` owned by `id` or any album under it.
    pub fn taken_at_range(&self, id: AlbumId, photos: &[PhotoItem]) -> Result<TakenAtRange> {
        let node = self.get(id)?;
        let positioned = self.position_photos(photos)?;
        Ok(aggregate::min_max_under(node, &positioned))
    }

    /// Pair each photo with the `left` bound of its album.
    pub fn position_photos<'a>(&self, photos: &'a [PhotoItem]) -> Result<Vec<PositionedPhoto<'a>>> {
        photos
            .iter()
            .map(|photo| {
                let album = self.get(photo.album_id)?;
                Ok(PositionedPhoto {
                    position: album.interval.left,
                    photo,
                })
            })
            .collect()
    }

    /// Count structural errors without trusting any single relation.
    pub fn check(&self) -> TreeErrors {
        let mut errors = TreeErrors::default();

        let mut seen: HashMap<u64, usize> = HashMap::new();
        for node in self.nodes.values() {
            if node.interval.left >= node.interval.right {
                errors.oddness += 1;
            }
            *seen.entry(node.interval.left).or_default() += 1;
            *seen.entry(node.interval.right).or_default() += 1;
            if let Some(parent_id) = node.parent_id {
                if !self.nodes.contains_key(&parent_id) {
                    errors.missing_parent += 1;
                }
            }
        }
        errors.duplicates = seen.values().filter(|&&count| count > 1).count();

        // Sweep in pre-order keeping the chain of open intervals; the top of
        // the stack is the tightest enclosing node.
        let mut open: Vec<&AlbumNode> = Vec::new();
        for node in self.nodes_in_order() {
            while open
                .last()
                .is_some_and(|top| top.interval.right < node.interval.left)
            {
                open.pop();
            }
            let enclosing = open.last().copied();
            if enclosing.is_some_and(|top| top.interval.partially_overlaps(&node.interval)) {
                errors.overlaps += 1;
            }

            let tightest = enclosing
                .filter(|top| top.interval.strictly_contains(&node.interval))
                .map(|top| top.id);
            let parent_known = node
                .parent_id
                .map_or(true, |pid| self.nodes.contains_key(&pid));
            if parent_known && tightest != node.parent_id {
                errors.wrong_parent += 1;
            }
            open.push(node);
        }

        errors
    }

    pub fn ensure_consistent(&self) -> Result<()> {
        let errors = self.check();
        if errors.is_broken() {
            error!(%errors, "album tree failed consistency check");
            return Err(Error::ConsistencyViolation(errors.to_string()));
        }
        Ok(())
    }

    /// Recompute every interval from parent links. Siblings keep their
    /// current left-to-right order (ties broken by id). Returns only the
    /// nodes whose bounds change.
    pub fn rebuild(&self) -> Result<Vec<(AlbumId, Interval)>> {
        let mut children: HashMap<Option<AlbumId>, Vec<&AlbumNode>> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent_id {
                if !self.nodes.contains_key(&parent_id) {
                    error!(album = node.id, missing_parent = parent_id, "cannot rebuild tree");
                    return Err(Error::BrokenChain {
                        album: node.id,
                        missing_parent: parent_id,
                    });
                }
            }
            children.entry(node.parent_id).or_default().push(node);
        }
        for list in children.values_mut() {
            list.sort_by_key(|n| (n.interval.left, n.id));
        }

        enum Step<'a> {
            Enter(&'a AlbumNode),
            Leave(AlbumId, u64),
        }

        let mut assigned: BTreeMap<AlbumId, Interval> = BTreeMap::new();
        let mut counter = 0u64;
        let mut stack: Vec<Step> = children
            .get(&None)
            .map(|roots| roots.iter().rev().map(|&n| Step::Enter(n)).collect())
            .unwrap_or_default();

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node) => {
                    counter += 1;
                    stack.push(Step::Leave(node.id, counter));
                    if let Some(kids) = children.get(&Some(node.id)) {
                        stack.extend(kids.iter().rev().map(|&n| Step::Enter(n)));
                    }
                }
                Step::Leave(id, left) => {
                    counter += 1;
                    assigned.insert(id, Interval { left, right: counter });
                }
            }
        }

        if assigned.len() != self.nodes.len() {
            let unreachable = self.nodes.len() - assigned.len();
            error!(unreachable, "parent links contain a loop");
            return Err(Error::ConsistencyViolation(format!(
                "{unreachable} albums are not reachable from any root"
            )));
        }

        Ok(assigned
            .into_iter()
            .filter(|(id, interval)| self.nodes[id].interval != *interval)
            .collect())
    }

    /// Rebuild in place. Returns the number of nodes whose bounds changed.
    pub fn fix(&mut self) -> Result<usize> {
        let changes = self.rebuild()?;
        for (id, interval) in &changes {
            if let Some(node) = self.nodes.get_mut(id) {
                node.interval = *interval;
            }
        }
        Ok(changes.len())
    }

    fn select(&self, keep: impl Fn(&AlbumNode) -> bool) -> Vec<&AlbumNode> {
        let mut nodes: Vec<&AlbumNode> = self.nodes.values().filter(|&n| keep(n)).collect();
        nodes.sort_by_key(|n| n.interval.left);
        nodes
    }
}

/// Calls are applied directly; go through [`Forest::transaction`] to get
/// rollback on failure.
impl IntervalStore for Forest {
    fn node(&self, id: AlbumId) -> Result<AlbumNode> {
        self.get(id).cloned()
    }

    fn max_right(&self) -> Result<u64> {
        Ok(self.nodes.values().map(|n| n.interval.right).max().unwrap_or(0))
    }

    fn renumber(&mut self, plan: &Renumbering) -> Result<usize> {
        if plan.is_empty() {
            return Ok(0);
        }
        let mut changed = 0;
        for node in self.nodes.values_mut() {
            if plan.touches(&node.interval) {
                node.interval = Interval {
                    left: plan.apply(node.interval.left)?,
                    right: plan.apply(node.interval.right)?,
                };
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn create(
        &mut self,
        parent_id: Option<AlbumId>,
        interval: Interval,
        title: &str,
    ) -> Result<AlbumId> {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            AlbumNode {
                id,
                parent_id,
                interval,
                title: title.to_string(),
            },
        );
        Ok(id)
    }

    fn remove_range(&mut self, range: Interval) -> Result<usize> {
        let before = self.nodes.len();
        self.nodes
            .retain(|_, n| !(n.interval.left >= range.left && n.interval.right <= range.right));
        Ok(before - self.nodes.len())
    }

    fn set_parent(&mut self, id: AlbumId, parent_id: Option<AlbumId>) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(Error::NotFound(id))?;
        node.parent_id = parent_id;
        Ok(())
    }

    fn verify(&self) -> Result<()> {
        self.ensure_consistent()
    }
}

/// A photo placed at its album's `left` bound.
#[derive(Debug, Clone, Copy)]
pub struct PositionedPhoto<'a> {
    pub position: u64,
    pub photo: &'a PhotoItem,
}

impl Aggregatable for PositionedPhoto<'_> {
    fn position(&self) -> u64 {
        self.position
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.photo.taken_at
    }
}
