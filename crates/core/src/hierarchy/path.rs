use std::collections::HashSet;

use tracing::error;

use crate::domain::{AlbumId, AlbumNode};
use crate::error::{Error, Result};

/// A node that can be named along a root-to-node path.
pub trait Pathable {
    fn path_id(&self) -> AlbumId;
    fn path_parent(&self) -> Option<AlbumId>;
    fn title(&self) -> &str;
}

impl Pathable for AlbumNode {
    fn path_id(&self) -> AlbumId {
        self.id
    }

    fn path_parent(&self) -> Option<AlbumId> {
        self.parent_id
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl<T: Pathable + ?Sized> Pathable for &T {
    fn path_id(&self) -> AlbumId {
        (**self).path_id()
    }

    fn path_parent(&self) -> Option<AlbumId> {
        (**self).path_parent()
    }

    fn title(&self) -> &str {
        (**self).title()
    }
}

/// Join titles from the root down to `node`, following `parent_id` links
/// through `lookup`.
pub fn full_path<N, P, F>(node: &N, separator: &str, mut lookup: F) -> Result<String>
where
    N: Pathable + ?Sized,
    P: Pathable,
    F: FnMut(AlbumId) -> Result<Option<P>>,
{
    let mut titles = vec![node.title().to_string()];
    let mut visited = HashSet::from([node.path_id()]);
    let mut child = node.path_id();
    let mut next = node.path_parent();

    while let Some(parent_id) = next {
        let Some(parent) = lookup(parent_id)? else {
            error!(album = child, missing_parent = parent_id, "broken parent chain");
            return Err(Error::BrokenChain {
                album: child,
                missing_parent: parent_id,
            });
        };
        if !visited.insert(parent.path_id()) {
            error!(album = node.path_id(), parent_id, "parent chain loops");
            return Err(Error::ConsistencyViolation(format!(
                "parent chain of album {} loops back to album {parent_id}",
                node.path_id()
            )));
        }
        titles.push(parent.title().to_string());
        child = parent.path_id();
        next = parent.path_parent();
    }

    titles.reverse();
    Ok(titles.join(separator))
}
