//! Depth-first enumeration of scan jobs.
//!
//! A single enumerator thread walks the tree and pushes one job per
//! filesystem entry into a bounded channel. Backpressure from the
//! channel throttles the walk whenever the workers fall behind.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use fsbelt_core::EntityId;
use tracing::debug;

use crate::cancel::CancelFlag;

/// Capacity of the jobs channel.
pub(crate) const JOB_CHANNEL_CAPACITY: usize = 32;

/// Error note attached to directories sitting at the recursion limit.
pub const RECURSION_LIMIT_MESSAGE: &str = "recursion limit reached";

/// Error note attached to symbolic links, which are never followed.
pub const SYMLINK_MESSAGE: &str = "symlink not followed";

/// One unit of scan work: a filesystem entry awaiting conversion.
#[derive(Debug)]
pub(crate) struct ScanJob {
    pub id: EntityId,
    pub parent_id: Option<EntityId>,
    pub full_path: PathBuf,
    /// Stat data captured during enumeration, `None` when the stat
    /// itself failed.
    pub metadata: Option<Metadata>,
    pub is_dir: bool,
    pub depth: u32,
    /// Non-fatal failure captured during enumeration.
    pub error: Option<String>,
}

impl ScanJob {
    fn new(
        id: EntityId,
        parent_id: Option<EntityId>,
        full_path: PathBuf,
        metadata: Metadata,
        depth: u32,
    ) -> Self {
        let is_dir = metadata.is_dir();
        Self {
            id,
            parent_id,
            full_path,
            metadata: Some(metadata),
            is_dir,
            depth,
            error: None,
        }
    }

    fn failed(
        id: EntityId,
        parent_id: Option<EntityId>,
        full_path: PathBuf,
        depth: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id,
            parent_id,
            full_path,
            metadata: None,
            is_dir: false,
            depth,
            error: Some(error.into()),
        }
    }
}

/// Spawn the enumerator thread.
///
/// The walk owns the only `Sender`, so the channel closes as soon as
/// the walk finishes or aborts, letting the workers drain and exit.
pub(crate) fn spawn_enumerator(
    root: PathBuf,
    max_depth: Option<u32>,
    cancel: CancelFlag,
    jobs: Sender<ScanJob>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let completed = visit(&jobs, &cancel, root, None, 0, max_depth);
        debug!(completed, "enumeration finished");
    })
}

/// Visit one path, emit exactly one job for it, then recurse into
/// directory children.
///
/// Returns `false` when the walk should stop early, either because
/// cancellation tripped or because every receiver went away.
fn visit(
    jobs: &Sender<ScanJob>,
    cancel: &CancelFlag,
    path: PathBuf,
    parent_id: Option<EntityId>,
    depth: u32,
    max_depth: Option<u32>,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    let id = EntityId::generate();

    // The recursion below never descends past the limit, so this only
    // fires if the depth accounting breaks.
    if max_depth.is_some_and(|limit| depth > limit) {
        let job = ScanJob::failed(id, parent_id, path, depth, RECURSION_LIMIT_MESSAGE);
        return jobs.send(job).is_ok();
    }

    let metadata = match fs::symlink_metadata(&path) {
        Ok(metadata) => metadata,
        Err(err) => {
            let error = format!("failed to stat entry: {err}");
            let job = ScanJob::failed(id, parent_id, path, depth, error);
            return jobs.send(job).is_ok();
        }
    };

    // Symlinks are reported but never followed, so link cycles cannot
    // trap the walk.
    if metadata.file_type().is_symlink() {
        let mut job = ScanJob::new(id, parent_id, path, metadata, depth);
        job.error = Some(SYMLINK_MESSAGE.to_string());
        return jobs.send(job).is_ok();
    }

    if !metadata.is_dir() {
        let job = ScanJob::new(id, parent_id, path, metadata, depth);
        return jobs.send(job).is_ok();
    }

    let mut job = ScanJob::new(id, parent_id, path.clone(), metadata, depth);
    if max_depth.is_some_and(|limit| depth == limit) {
        job.error = Some(RECURSION_LIMIT_MESSAGE.to_string());
        return jobs.send(job).is_ok();
    }

    let children = match read_children(&path) {
        Ok(children) => children,
        Err(err) => {
            job.error = Some(format!("failed to read directory: {err}"));
            return jobs.send(job).is_ok();
        }
    };

    let dir_id = job.id;
    if jobs.send(job).is_err() {
        return false;
    }
    for child in children {
        if !visit(jobs, cancel, child, Some(dir_id), depth + 1, max_depth) {
            return false;
        }
    }
    true
}

fn read_children(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(path)? {
        children.push(entry?.path());
    }
    Ok(children)
}
