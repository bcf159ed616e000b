//! Nested-set album hierarchy: interval queries, structural mutation,
//! subtree aggregation and path resolution.

pub mod aggregate;
pub mod forest;
pub mod interval;
pub mod mutator;
pub mod path;

pub use aggregate::{min_max_under, Aggregatable};
pub use forest::Forest;
pub use interval::{is_descendant, HierarchyNode, Interval};
pub use mutator::{IntervalStore, Renumbering, Shift};
pub use path::{full_path, Pathable};
