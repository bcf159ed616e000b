use chrono::{DateTime, Utc};

use super::interval::HierarchyNode;
use crate::domain::TakenAtRange;

/// An item hung somewhere in the tree, carrying an optional timestamp.
pub trait Aggregatable {
    /// The `left` bound of the album that owns this item.
    fn position(&self) -> u64;
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl<T: Aggregatable + ?Sized> Aggregatable for &T {
    fn position(&self) -> u64 {
        (**self).position()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).timestamp()
    }
}

/// Earliest and latest timestamp of the items inside `node`'s subtree range.
/// Items without a timestamp are skipped.
pub fn min_max_under<N, I>(node: &N, items: I) -> TakenAtRange
where
    N: HierarchyNode + ?Sized,
    I: IntoIterator,
    I::Item: Aggregatable,
{
    let range = node.subtree_range();
    items
        .into_iter()
        .filter(|item| range.covers_position(item.position()))
        .filter_map(|item| item.timestamp())
        .fold(TakenAtRange::default(), |acc, ts| TakenAtRange {
            min: Some(acc.min.map_or(ts, |min| min.min(ts))),
            max: Some(acc.max.map_or(ts, |max| max.max(ts))),
        })
}
