//! Filesystem entity types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bytes::pretty_bytes;

/// Synthetic identifier for an entity, unique within a single scan.
///
/// Ids exist only to thread parent/child relationships through the
/// concurrent pipeline; they are regenerated on every scan and must not
/// be treated as stable external keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Classification of a filesystem entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Everything else: symlinks, sockets, devices. Never followed or hashed.
    Other,
}

impl EntityKind {
    /// Derive the kind from stat flags.
    pub fn classify(is_dir: bool, is_regular: bool) -> Self {
        if is_dir {
            Self::Directory
        } else if is_regular {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntityKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntityKind::File)
    }
}

/// A single file, directory, or other entry in the scanned tree.
///
/// Serializes to the JSON shape consumed by the CLI, so field casing and
/// presence rules matter: optional fields disappear from the output when
/// unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsEntity {
    /// Identifier of this entity within the scan.
    pub id: EntityId,

    /// Identifier of the containing directory; `None` only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,

    /// Entry name (not the full path).
    pub name: CompactString,

    /// File extension including the leading dot; empty for directories
    /// and extensionless files.
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub extension: CompactString,

    /// Absolute path of the entry.
    pub full_path: PathBuf,

    /// Size in bytes. Stat size for files; aggregate of all descendants
    /// for directories once sizes have been populated.
    pub size: u64,

    /// Human-readable rendering of `size`. Derived, non-authoritative.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pretty_size: String,

    /// SHA-512 content hash in lowercase hex, when hashing was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,

    /// Whether the entity is a directory.
    pub is_dir: bool,

    /// Entity classification.
    pub entity_type: EntityKind,

    /// Unix permission bits (lower nine bits of the mode).
    pub permissions: u32,

    /// Last modification time.
    pub last_modified: DateTime<Utc>,

    /// Distance from the scan root (root = 0).
    pub depth: u32,

    /// Child entities; files and subdirectories combined, empty for files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FsEntity>,

    /// Non-fatal per-entry error, surfaced without aborting the scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FsEntity {
    /// Create a regular-file entity.
    #[allow(clippy::too_many_arguments)]
    pub fn new_file(
        id: EntityId,
        parent_id: Option<EntityId>,
        name: impl Into<CompactString>,
        extension: impl Into<CompactString>,
        full_path: impl Into<PathBuf>,
        size: u64,
        permissions: u32,
        last_modified: DateTime<Utc>,
        depth: u32,
    ) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            extension: extension.into(),
            full_path: full_path.into(),
            size,
            pretty_size: String::new(),
            file_hash: None,
            is_dir: false,
            entity_type: EntityKind::File,
            permissions,
            last_modified,
            depth,
            children: Vec::new(),
            error_message: None,
        }
    }

    /// Create a directory entity. Size stays zero until aggregation.
    pub fn new_directory(
        id: EntityId,
        parent_id: Option<EntityId>,
        name: impl Into<CompactString>,
        full_path: impl Into<PathBuf>,
        permissions: u32,
        last_modified: DateTime<Utc>,
        depth: u32,
    ) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            extension: CompactString::default(),
            full_path: full_path.into(),
            size: 0,
            pretty_size: String::new(),
            file_hash: None,
            is_dir: true,
            entity_type: EntityKind::Directory,
            permissions,
            last_modified,
            depth,
            children: Vec::new(),
            error_message: None,
        }
    }

    /// Create an entity for symlinks, devices, and other non-regular entries.
    pub fn new_other(
        id: EntityId,
        parent_id: Option<EntityId>,
        name: impl Into<CompactString>,
        full_path: impl Into<PathBuf>,
        permissions: u32,
        last_modified: DateTime<Utc>,
        depth: u32,
    ) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            extension: CompactString::default(),
            full_path: full_path.into(),
            size: 0,
            pretty_size: String::new(),
            file_hash: None,
            is_dir: false,
            entity_type: EntityKind::Other,
            permissions,
            last_modified,
            depth,
            children: Vec::new(),
            error_message: None,
        }
    }

    /// Check if this entity is a directory.
    pub fn is_dir(&self) -> bool {
        self.entity_type.is_dir()
    }

    /// Check if this entity is a regular file.
    pub fn is_file(&self) -> bool {
        self.entity_type.is_file()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Count this entity plus all descendants.
    pub fn entity_count(&self) -> u64 {
        1 + self.children.iter().map(FsEntity::entity_count).sum::<u64>()
    }

    /// Recompute directory sizes bottom-up and refresh `pretty_size`
    /// on every entity.
    ///
    /// Files keep their stat-reported size; every directory ends up with
    /// the exact sum of its children's sizes.
    pub fn aggregate_sizes(&mut self) {
        if self.is_dir {
            let mut total: u64 = 0;
            for child in &mut self.children {
                child.aggregate_sizes();
                total += child.size;
            }
            self.size = total;
        }
        self.pretty_size = pretty_bytes(self.size);
    }
}
