use gix::ObjectId;
use itertools::Itertools;

use crate::{
    error::BlobFetchError,
    store::{
        EntryKind,
        ObjectStore,
    },
};

/// Walks the tree depth first in stored entry order and returns the ids
/// of every file entry whose blob is absent from the store, in the order
/// they were met.  An id referenced by more than one entry is listed
/// once per entry.
///
/// Sub-trees are expanded fully before the remaining entries of their
/// parent.  The walk keeps its own stack, so nesting depth is bounded
/// by memory rather than by the call stack.
pub fn collect_missing_blobs(
    store: &impl ObjectStore,
    tree: &ObjectId,
) -> Result<Vec<ObjectId>, BlobFetchError> {
    let mut missing = Vec::new();
    let mut stack = vec![store.tree_entries(tree)?.into_iter()];
    while let Some(entries) = stack.last_mut() {
        let Some(entry) = entries.next() else {
            stack.pop();
            continue;
        };
        match entry.kind {
            EntryKind::Directory => {
                trace!("descending into {} ({})", entry.name, entry.oid);
                stack.push(store.tree_entries(&entry.oid)?.into_iter());
            }
            EntryKind::File => {
                if !store.contains(&entry.oid) {
                    trace!("missing blob {} ({})", entry.oid, entry.name);
                    missing.push(entry.oid);
                }
            }
            EntryKind::Submodule => {
                debug!("skipping submodule {} at {}", entry.name, entry.oid);
            }
        }
    }
    Ok(missing)
}

/// Drops repeated ids, keeping the first occurrence of each.
pub fn unique_blobs(blobs: &[ObjectId]) -> Vec<ObjectId> {
    blobs.iter()
        .copied()
        .unique()
        .collect()
}
