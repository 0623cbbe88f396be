//! Single-threaded collation of flat scan results into a tree.

use fsbelt_core::{FsEntity, ScanError, ScanStats};
use tracing::debug;

use crate::forest::PartialForest;

/// Reassemble the entity tree from the flat forest, then aggregate
/// directory sizes bottom-up.
///
/// Every `take_*` call removes what it returns, so anything left in the
/// forest afterwards was produced by a worker but claimed by no
/// directory. That indicates corrupted parent links and is reported
/// instead of being dropped silently.
pub(crate) fn collate(mut forest: PartialForest) -> Result<(FsEntity, ScanStats), ScanError> {
    let mut root = take_root(&mut forest)?;
    attach_children(&mut root, &mut forest);

    let remaining = forest.remaining();
    if remaining > 0 {
        return Err(ScanError::OrphanedEntities { count: remaining });
    }

    root.aggregate_sizes();
    Ok((root, forest.take_stats()))
}

/// The root is the single directory recorded without a parent.
fn take_root(forest: &mut PartialForest) -> Result<FsEntity, ScanError> {
    let mut roots = forest.take_dirs(None);
    match roots.len() {
        1 => Ok(roots.remove(0)),
        0 => Err(ScanError::other("scan produced no root entity")),
        n => Err(ScanError::other(format!("scan produced {n} root entities"))),
    }
}

/// Attach files first, then recursively collated subdirectories, each
/// group sorted by name for deterministic output.
fn attach_children(entity: &mut FsEntity, forest: &mut PartialForest) {
    let parent = Some(entity.id);

    let mut files = forest.take_files(parent);
    files.sort_by(|a, b| a.name.cmp(&b.name));
    let file_count = files.len();
    entity.children.extend(files);

    let mut dirs = forest.take_dirs(parent);
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    for mut dir in dirs {
        attach_children(&mut dir, forest);
        entity.children.push(dir);
    }

    debug!(id = %entity.id, files = file_count, "entity collated");
}
