use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hierarchy::interval::Interval;

pub type AlbumId = i64;

/// One album in the nested-set tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumNode {
    pub id: AlbumId,
    pub parent_id: Option<AlbumId>,
    pub interval: Interval,
    pub title: String,
}

/// A photo owned by exactly one album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoItem {
    pub id: i64,
    pub album_id: AlbumId,
    pub title: String,
    pub taken_at: Option<DateTime<Utc>>,
}

/// Earliest and latest `taken_at` of the photos in a subtree.
///
/// Always derived from the photos; there is no way to set it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TakenAtRange {
    pub min: Option<DateTime<Utc>>,
    pub max: Option<DateTime<Utc>>,
}

impl TakenAtRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }
}

/// Error counts reported by a full tree check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeErrors {
    /// Nodes with `left >= right`.
    pub oddness: usize,
    /// Bound values used more than once.
    pub duplicates: usize,
    /// Nodes whose parent is not the tightest enclosing node.
    pub wrong_parent: usize,
    /// Nodes whose `parent_id` refers to nothing.
    pub missing_parent: usize,
    /// Pairs of partially overlapping intervals.
    pub overlaps: usize,
}

impl TreeErrors {
    pub fn is_broken(&self) -> bool {
        self.total() > 0
    }

    pub fn total(&self) -> usize {
        self.oddness + self.duplicates + self.wrong_parent + self.missing_parent + self.overlaps
    }
}

impl std::fmt::Display for TreeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "oddness={} duplicates={} wrong_parent={} missing_parent={} overlaps={}",
            self.oddness, self.duplicates, self.wrong_parent, self.missing_parent, self.overlaps
        )
    }
}

/// Everything the gallery shows about a single album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumSummary {
    pub album: AlbumNode,
    pub path: String,
    pub taken_at: TakenAtRange,
    pub photo_count: usize,
    pub depth: usize,
}
