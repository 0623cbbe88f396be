//! Shared scan state, bucketed by parent id.

use std::collections::HashMap;

use fsbelt_core::{EntityId, FsEntity, ScanStats};

/// Flat scan results awaiting collation.
///
/// Workers insert entities under a mutex while the scan runs; the
/// collator takes exclusive ownership afterwards. The `take_*` methods
/// remove what they return, so the maps double as the collation work
/// queue and must be empty once the tree is rebuilt.
#[derive(Debug, Default)]
pub(crate) struct PartialForest {
    files: HashMap<Option<EntityId>, Vec<FsEntity>>,
    dirs: HashMap<Option<EntityId>, Vec<FsEntity>>,
    stats: ScanStats,
}

impl PartialForest {
    /// Bucket one converted entity under its parent.
    pub fn insert(&mut self, entity: FsEntity) {
        self.stats.record(&entity);
        let buckets = if entity.is_dir { &mut self.dirs } else { &mut self.files };
        buckets.entry(entity.parent_id).or_default().push(entity);
    }

    /// Remove and return the non-directories recorded under a parent.
    pub fn take_files(&mut self, parent: Option<EntityId>) -> Vec<FsEntity> {
        self.files.remove(&parent).unwrap_or_default()
    }

    /// Remove and return the directories recorded under a parent.
    pub fn take_dirs(&mut self, parent: Option<EntityId>) -> Vec<FsEntity> {
        self.dirs.remove(&parent).unwrap_or_default()
    }

    /// Take the counters accumulated during insertion.
    pub fn take_stats(&mut self) -> ScanStats {
        std::mem::take(&mut self.stats)
    }

    /// Number of entities not yet claimed by a `take_*` call.
    pub fn remaining(&self) -> usize {
        self.files.values().map(Vec::len).sum::<usize>()
            + self.dirs.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fsbelt_core::EntityKind;

    use super::*;

    fn file_under(parent: Option<EntityId>, name: &str, size: u64) -> FsEntity {
        FsEntity::new_file(
            EntityId::generate(),
            parent,
            name,
            ".txt",
            format!("/tmp/{name}"),
            size,
            0o644,
            Utc::now(),
            1,
        )
    }

    #[test]
    fn test_insert_buckets_by_parent_and_kind() {
        let mut forest = PartialForest::default();
        let parent = Some(EntityId::generate());
        forest.insert(file_under(parent, "a.txt", 1));
        forest.insert(file_under(parent, "b.txt", 2));
        forest.insert(FsEntity::new_directory(
            EntityId::generate(),
            parent,
            "sub",
            "/tmp/sub",
            0o755,
            Utc::now(),
            1,
        ));

        assert_eq!(forest.remaining(), 3);
        let files = forest.take_files(parent);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|e| e.entity_type == EntityKind::File));
        let dirs = forest.take_dirs(parent);
        assert_eq!(dirs.len(), 1);
        assert_eq!(forest.remaining(), 0);

        let stats = forest.take_stats();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.dirs, 1);
    }

    #[test]
    fn test_take_missing_parent_is_empty() {
        let mut forest = PartialForest::default();
        assert!(forest.take_files(None).is_empty());
        assert!(forest.take_dirs(Some(EntityId::generate())).is_empty());
    }
}
