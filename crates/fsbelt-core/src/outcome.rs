//! Scan result container and statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, FsEntity};

/// Summary counters for a completed scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Number of regular files.
    pub files: u64,
    /// Number of directories, root included.
    pub dirs: u64,
    /// Number of non-regular entries (symlinks, devices, sockets).
    pub others: u64,
    /// Entries that carry a per-entry error message.
    pub failed: u64,
    /// Total bytes under the root after size aggregation.
    pub total_size: u64,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one converted entity in the counters.
    pub fn record(&mut self, entity: &FsEntity) {
        match entity.entity_type {
            EntityKind::File => self.files += 1,
            EntityKind::Directory => self.dirs += 1,
            EntityKind::Other => self.others += 1,
        }
        if entity.error_message.is_some() {
            self.failed += 1;
        }
    }

    /// Total number of entities seen.
    pub fn entity_count(&self) -> u64 {
        self.files + self.dirs + self.others
    }
}

/// Completed scan: the collated entity tree plus summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Root entity of the scanned tree.
    pub root: FsEntity,

    /// Summary statistics.
    pub stats: ScanStats,
}

impl ScanOutcome {
    /// Create a new scan outcome.
    pub fn new(root: FsEntity, stats: ScanStats) -> Self {
        Self { root, stats }
    }

    /// Total size of the scanned tree in bytes.
    pub fn total_size(&self) -> u64 {
        self.root.size
    }
}
