//! Worker pool draining the jobs channel.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tracing::warn;

use crate::cancel::CancelFlag;
use crate::convert::job_to_entity;
use crate::enumerate::ScanJob;
use crate::forest::PartialForest;

/// Spawn `count` worker threads.
///
/// Each worker owns a clone of the receiver and exits once the channel
/// is closed and drained, or as soon as cancellation trips. Dropping
/// every receiver also tells the enumerator to stop: its next send
/// fails and the walk unwinds.
pub(crate) fn spawn_workers(
    count: usize,
    jobs: Receiver<ScanJob>,
    forest: Arc<Mutex<PartialForest>>,
    cancel: CancelFlag,
    compute_hashes: bool,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|_| {
            let jobs = jobs.clone();
            let forest = Arc::clone(&forest);
            let cancel = cancel.clone();
            thread::spawn(move || {
                while let Ok(job) = jobs.recv() {
                    if cancel.is_cancelled() {
                        break;
                    }
                    if let Some(error) = &job.error {
                        warn!(path = %job.full_path.display(), error = %error, "scan job carried an error");
                    }
                    let entity = job_to_entity(job, compute_hashes);
                    forest
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(entity);
                }
            })
        })
        .collect()
}
