//! Job-to-entity conversion and content hashing.

use std::fs::{File, Metadata};
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use fsbelt_core::FsEntity;
use sha2::{Digest, Sha512};
use tracing::warn;

use crate::enumerate::ScanJob;

/// Convert one scan job into an entity.
///
/// Hashing happens here, on the worker thread and outside any lock, so
/// only the forest insert is serialized. A failed hash downgrades to an
/// error note on the entity rather than failing the scan.
pub(crate) fn job_to_entity(job: ScanJob, compute_hashes: bool) -> FsEntity {
    let name = entry_name(&job.full_path);

    let Some(metadata) = job.metadata else {
        // The stat failed; only identity fields are known.
        let mut entity = FsEntity::new_other(
            job.id,
            job.parent_id,
            name,
            job.full_path,
            0,
            DateTime::<Utc>::UNIX_EPOCH,
            job.depth,
        );
        entity.error_message = job.error;
        return entity;
    };

    let modified = modified_time(&metadata);
    let permissions = permission_bits(&metadata);

    let mut entity = if metadata.is_dir() {
        FsEntity::new_directory(
            job.id,
            job.parent_id,
            name,
            job.full_path,
            permissions,
            modified,
            job.depth,
        )
    } else if metadata.is_file() {
        let extension = extension_of(&job.full_path);
        let mut entity = FsEntity::new_file(
            job.id,
            job.parent_id,
            name,
            extension,
            job.full_path,
            metadata.len(),
            permissions,
            modified,
            job.depth,
        );
        if compute_hashes {
            match hash_file(&entity.full_path) {
                Ok(hash) => entity.file_hash = Some(hash),
                Err(err) => {
                    warn!(path = %entity.full_path.display(), error = %err, "failed to hash file");
                    entity.error_message = Some(format!("failed to hash file: {err}"));
                }
            }
        }
        entity
    } else {
        FsEntity::new_other(
            job.id,
            job.parent_id,
            name,
            job.full_path,
            permissions,
            modified,
            job.depth,
        )
    };

    if job.error.is_some() {
        entity.error_message = job.error;
    }
    entity
}

/// Stream a file through SHA-512, returning the digest as lowercase hex.
pub(crate) fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

/// Final path component, falling back to the whole path for roots like `/`.
fn entry_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}

/// Suffix of the name from its final dot, empty when the name has no
/// dot. A dotfile keeps its whole name (`.bashrc` yields ".bashrc").
fn extension_of(path: &Path) -> CompactString {
    let Some(name) = path.file_name() else {
        return CompactString::default();
    };
    let name = name.to_string_lossy();
    match name.rfind('.') {
        Some(dot) => CompactString::new(&name[dot..]),
        None => CompactString::default(),
    }
}

fn modified_time(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Get the Unix permission bits from metadata.
#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use fsbelt_core::{EntityId, EntityKind};
    use tempfile::TempDir;

    use super::*;

    fn job_for(path: &Path, parent: Option<EntityId>, depth: u32) -> ScanJob {
        let metadata = fs::symlink_metadata(path).unwrap();
        let is_dir = metadata.is_dir();
        ScanJob {
            id: EntityId::generate(),
            parent_id: parent,
            full_path: path.to_path_buf(),
            metadata: Some(metadata),
            is_dir,
            depth,
            error: None,
        }
    }

    #[test]
    fn test_file_conversion() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();

        let entity = job_to_entity(job_for(&path, None, 1), false);

        assert_eq!(entity.entity_type, EntityKind::File);
        assert_eq!(entity.name.as_str(), "notes.txt");
        assert_eq!(entity.extension.as_str(), ".txt");
        assert_eq!(entity.size, 5);
        assert!(entity.file_hash.is_none());
        assert!(entity.error_message.is_none());
    }

    #[test]
    fn test_directory_conversion() {
        let temp = TempDir::new().unwrap();
        let entity = job_to_entity(job_for(temp.path(), None, 0), false);

        assert_eq!(entity.entity_type, EntityKind::Directory);
        assert!(entity.is_dir);
        assert_eq!(entity.size, 0);
        assert!(entity.extension.is_empty());
    }

    #[test]
    fn test_failed_job_keeps_identity_and_error() {
        let job = ScanJob {
            id: EntityId::generate(),
            parent_id: None,
            full_path: "/nonexistent/entry".into(),
            metadata: None,
            is_dir: false,
            depth: 3,
            error: Some("failed to stat entry: gone".to_string()),
        };

        let entity = job_to_entity(job, true);

        assert_eq!(entity.entity_type, EntityKind::Other);
        assert_eq!(entity.depth, 3);
        assert_eq!(
            entity.error_message.as_deref(),
            Some("failed to stat entry: gone")
        );
        assert!(entity.file_hash.is_none());
    }

    #[test]
    fn test_hash_known_vector() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abc.bin");
        fs::write(&path, b"abc").unwrap();

        let hash = hash_file(&path).unwrap();

        assert_eq!(
            hash,
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(extension_of(Path::new("/a/b.tar.gz")).as_str(), ".gz");
        assert_eq!(extension_of(Path::new("/a/Makefile")).as_str(), "");
        assert_eq!(extension_of(Path::new("/a/.bashrc")).as_str(), ".bashrc");
        assert_eq!(extension_of(Path::new("/a/trailing.")).as_str(), ".");
    }

    #[test]
    fn test_dotfile_extension_is_full_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".bashrc");
        fs::write(&path, b"export EDITOR=vi\n").unwrap();

        let entity = job_to_entity(job_for(&path, None, 1), false);

        assert_eq!(entity.name.as_str(), ".bashrc");
        assert_eq!(entity.extension.as_str(), ".bashrc");
    }
}
