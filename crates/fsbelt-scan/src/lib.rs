//! Concurrent filesystem scanning engine for fsbelt.
//!
//! # Overview
//!
//! A scan runs as a small pipeline:
//!
//! - One enumerator thread walks the tree depth-first and pushes one
//!   job per entry into a bounded channel.
//! - A pool of workers drains the channel, stats and hashes entries,
//!   and buckets the resulting entities by parent id.
//! - After both sides finish, a single-threaded collation pass rebuilds
//!   the tree and aggregates directory sizes.
//!
//! Per-entry failures (unreadable directories, vanished files, broken
//! symlinks) never abort the scan; they surface as `errorMessage` notes
//! on the affected entities. Only an unusable root is fatal.
//!
//! # Example
//!
//! ```rust,no_run
//! use fsbelt_scan::{ScanOptions, Scanner};
//!
//! let options = ScanOptions::builder()
//!     .root("/var/log")
//!     .compute_hashes(true)
//!     .build()?;
//!
//! let scanner = Scanner::new();
//! let outcome = scanner.scan(&options)?;
//! println!("{} entities, {} bytes", outcome.stats.entity_count(), outcome.total_size());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Cancellation is cooperative: clone the [`CancelFlag`] out of the
//! scanner, hand it to a signal handler, and the scan winds down at the
//! next pause point.

mod cancel;
mod collate;
mod convert;
mod enumerate;
mod forest;
mod worker;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crossbeam_channel::bounded;
use tracing::info;

use crate::collate::collate;
use crate::enumerate::{JOB_CHANNEL_CAPACITY, spawn_enumerator};
use crate::forest::PartialForest;
use crate::worker::spawn_workers;

pub use cancel::CancelFlag;
pub use enumerate::{RECURSION_LIMIT_MESSAGE, SYMLINK_MESSAGE};

// Re-export core types for convenience
pub use fsbelt_core::{
    EntityId, EntityKind, FsEntity, ScanError, ScanOptions, ScanOptionsBuilder, ScanOutcome,
    ScanStats,
};

/// Concurrent filesystem scanner.
///
/// A scanner is cheap to construct and holds nothing but its
/// cancellation flag, so one instance can run several scans in
/// sequence. Cancellation applies to whichever scan is running when the
/// flag trips.
pub struct Scanner {
    cancel: CancelFlag,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self {
            cancel: CancelFlag::new(),
        }
    }

    /// Handle to this scanner's cancellation flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Scan the tree rooted at `options.root`.
    ///
    /// Returns the collated entity tree with aggregated sizes, plus
    /// summary statistics. Fails only when the root itself is unusable,
    /// when the scan was cancelled, or when collation detects corrupted
    /// parent links.
    pub fn scan(&self, options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();
        let root = resolve_root(&options.root)?;
        let workers = if options.workers == 0 {
            num_cpus::get()
        } else {
            options.workers
        };
        info!(
            root = %root.display(),
            workers,
            max_depth = ?options.max_depth,
            compute_hashes = options.compute_hashes,
            "starting scan"
        );

        let (jobs_tx, jobs_rx) = bounded(JOB_CHANNEL_CAPACITY);
        let forest = Arc::new(Mutex::new(PartialForest::default()));

        let enumerator = spawn_enumerator(root, options.max_depth, self.cancel.clone(), jobs_tx);
        let handles = spawn_workers(
            workers,
            jobs_rx,
            Arc::clone(&forest),
            self.cancel.clone(),
            options.compute_hashes,
        );

        // Join barrier: once the walk returns the channel is closed, the
        // workers drain whatever is left and exit.
        let mut panicked = enumerator.join().is_err();
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        if panicked {
            return Err(ScanError::other("scan thread panicked"));
        }
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let forest = Arc::try_unwrap(forest)
            .map_err(|_| ScanError::other("scan state still shared after join"))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let (root_entity, mut stats) = collate(forest)?;
        stats.total_size = root_entity.size;
        stats.duration = started.elapsed();

        info!(
            entities = stats.entity_count(),
            total_size = stats.total_size,
            duration_ms = stats.duration.as_millis() as u64,
            "scan complete"
        );
        Ok(ScanOutcome::new(root_entity, stats))
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve and validate the scan root. The only fatal failure path: a
/// root that cannot be resolved or is not a directory aborts the scan
/// before any thread is spawned.
fn resolve_root(path: &Path) -> Result<PathBuf, ScanError> {
    let resolved = path.canonicalize().map_err(|source| ScanError::PathResolution {
        path: path.to_path_buf(),
        source,
    })?;
    let metadata = fs::metadata(&resolved).map_err(|err| ScanError::io(&resolved, err))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory { path: resolved });
    }
    Ok(resolved)
}
