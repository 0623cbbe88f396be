//! Integration tests for the concurrent scanner.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use fsbelt_scan::{
    EntityKind, FsEntity, RECURSION_LIMIT_MESSAGE, SYMLINK_MESSAGE, ScanError, ScanOptions,
    Scanner,
};
use tempfile::TempDir;

/// Standard fixture:
///
/// ```text
/// root/
///   a.txt        (10 bytes)
///   b.log        (3 bytes)
///   sub/
///     c.txt      (20 bytes)
///     deeper/
///       d.bin    (7 bytes)
/// ```
fn create_test_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write_file(&root.join("a.txt"), &[b'a'; 10]);
    write_file(&root.join("b.log"), b"log");
    fs::create_dir(root.join("sub")).unwrap();
    write_file(&root.join("sub/c.txt"), &[b'c'; 20]);
    fs::create_dir(root.join("sub/deeper")).unwrap();
    write_file(&root.join("sub/deeper/d.bin"), &[0u8; 7]);

    temp
}

fn write_file(path: &Path, contents: &[u8]) {
    let mut file = File::create(path).unwrap();
    file.write_all(contents).unwrap();
}

fn scan(options: &ScanOptions) -> fsbelt_scan::ScanOutcome {
    Scanner::new().scan(options).unwrap()
}

fn visit_all<'a>(entity: &'a FsEntity, out: &mut Vec<&'a FsEntity>) {
    out.push(entity);
    for child in &entity.children {
        visit_all(child, out);
    }
}

#[test]
fn test_every_entry_is_reported_exactly_once() {
    let temp = create_test_tree();
    let outcome = scan(&ScanOptions::new(temp.path()));

    // 3 directories (root, sub, deeper) + 4 files
    assert_eq!(outcome.root.entity_count(), 7);
    assert_eq!(outcome.stats.dirs, 3);
    assert_eq!(outcome.stats.files, 4);
    assert_eq!(outcome.stats.failed, 0);

    let mut entities = Vec::new();
    visit_all(&outcome.root, &mut entities);
    let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    for expected in ["a.txt", "b.log", "sub", "c.txt", "deeper", "d.bin"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
}

#[test]
fn test_directory_sizes_aggregate_bottom_up() {
    let temp = create_test_tree();
    let outcome = scan(&ScanOptions::new(temp.path()));

    assert_eq!(outcome.root.size, 40);
    assert_eq!(outcome.total_size(), 40);
    assert_eq!(outcome.stats.total_size, 40);

    let sub = outcome
        .root
        .children
        .iter()
        .find(|e| e.name == "sub")
        .unwrap();
    assert_eq!(sub.size, 27);
    let deeper = sub.children.iter().find(|e| e.name == "deeper").unwrap();
    assert_eq!(deeper.size, 7);
    assert_eq!(deeper.pretty_size, "7 B");
}

#[test]
fn test_tree_has_single_root_and_consistent_depths() {
    let temp = create_test_tree();
    let outcome = scan(&ScanOptions::new(temp.path()));

    let mut entities = Vec::new();
    visit_all(&outcome.root, &mut entities);

    assert_eq!(entities.iter().filter(|e| e.parent_id.is_none()).count(), 1);
    assert_eq!(outcome.root.depth, 0);
    for entity in &entities {
        for child in &entity.children {
            assert_eq!(child.depth, entity.depth + 1);
            assert_eq!(child.parent_id, Some(entity.id));
        }
    }
}

#[test]
fn test_rescan_is_identical_modulo_ids() {
    let temp = create_test_tree();
    let options = ScanOptions::new(temp.path());

    let first = scan(&options);
    let second = scan(&options);

    fn shape(entity: &FsEntity, out: &mut BTreeMap<String, (u64, u32, bool)>) {
        out.insert(
            entity.full_path.display().to_string(),
            (entity.size, entity.depth, entity.is_dir),
        );
        for child in &entity.children {
            shape(child, out);
        }
    }

    let mut a = BTreeMap::new();
    let mut b = BTreeMap::new();
    shape(&first.root, &mut a);
    shape(&second.root, &mut b);
    assert_eq!(a, b);
    assert_ne!(first.root.id, second.root.id);
}

#[test]
fn test_hashes_are_deterministic_and_content_sensitive() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("same.txt"), b"identical");
    write_file(&temp.path().join("twin.txt"), b"identical");
    write_file(&temp.path().join("other.txt"), b"different");

    let options = ScanOptions::builder()
        .root(temp.path())
        .compute_hashes(true)
        .build()
        .unwrap();
    let outcome = scan(&options);

    let hash_of = |name: &str| {
        outcome
            .root
            .children
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.file_hash.clone())
            .unwrap()
    };
    let same = hash_of("same.txt");
    assert_eq!(same.len(), 128);
    assert!(same.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(same, hash_of("twin.txt"));
    assert_ne!(same, hash_of("other.txt"));

    // Directories are never hashed
    assert!(outcome.root.file_hash.is_none());
}

#[test]
fn test_hashes_absent_unless_requested() {
    let temp = create_test_tree();
    let outcome = scan(&ScanOptions::new(temp.path()));

    let mut entities = Vec::new();
    visit_all(&outcome.root, &mut entities);
    assert!(entities.iter().all(|e| e.file_hash.is_none()));
}

#[test]
fn test_recursion_limit_bounds_depth_and_marks_boundary() {
    let temp = create_test_tree();
    let options = ScanOptions::builder()
        .root(temp.path())
        .max_depth(Some(1u32))
        .build()
        .unwrap();
    let outcome = scan(&options);

    let mut entities = Vec::new();
    visit_all(&outcome.root, &mut entities);

    assert!(entities.iter().all(|e| e.depth <= 1));
    assert!(!entities.iter().any(|e| e.name == "c.txt"));

    let sub = entities.iter().find(|e| e.name == "sub").unwrap();
    assert!(sub.is_dir);
    assert_eq!(sub.error_message.as_deref(), Some(RECURSION_LIMIT_MESSAGE));
    assert_eq!(sub.child_count(), 0);

    // Files at the boundary depth are unaffected
    let file = entities.iter().find(|e| e.name == "a.txt").unwrap();
    assert!(file.error_message.is_none());

    assert!(outcome.stats.failed >= 1);
}

#[test]
fn test_zero_depth_reports_only_root() {
    let temp = create_test_tree();
    let options = ScanOptions::builder()
        .root(temp.path())
        .max_depth(Some(0u32))
        .build()
        .unwrap();
    let outcome = scan(&options);

    assert_eq!(outcome.root.entity_count(), 1);
    assert_eq!(
        outcome.root.error_message.as_deref(),
        Some(RECURSION_LIMIT_MESSAGE)
    );
}

#[test]
fn test_scan_scales_across_workers() {
    let temp = TempDir::new().unwrap();
    for i in 0..100 {
        write_file(&temp.path().join(format!("file-{i:03}.dat")), &[1u8; 16]);
    }

    let options = ScanOptions::builder()
        .root(temp.path())
        .workers(4usize)
        .build()
        .unwrap();
    let outcome = scan(&options);

    assert_eq!(outcome.stats.files, 100);
    assert_eq!(outcome.root.size, 1600);
    assert_eq!(outcome.root.child_count(), 100);
}

#[test]
fn test_empty_directory_scans_clean() {
    let temp = TempDir::new().unwrap();
    let outcome = scan(&ScanOptions::new(temp.path()));

    assert_eq!(outcome.root.entity_count(), 1);
    assert_eq!(outcome.root.size, 0);
    assert_eq!(outcome.root.pretty_size, "0 B");
    assert!(outcome.root.children.is_empty());
}

#[test]
fn test_missing_root_fails_before_spawning() {
    let result = Scanner::new().scan(&ScanOptions::new("/no/such/root/anywhere"));
    assert!(matches!(result, Err(ScanError::PathResolution { .. })));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subtree_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_test_tree();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    write_file(&locked.join("hidden.txt"), b"secret");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Running privileged; permission bits cannot block the walk
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let outcome = scan(&ScanOptions::new(temp.path()));

    // Restore so TempDir can clean up
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let mut entities = Vec::new();
    visit_all(&outcome.root, &mut entities);
    let locked_entity = entities.iter().find(|e| e.name == "locked").unwrap();
    assert!(locked_entity.is_dir);
    let message = locked_entity.error_message.as_deref().unwrap();
    assert!(message.starts_with("failed to read directory"), "{message}");
    assert!(!entities.iter().any(|e| e.name == "hidden.txt"));
    assert!(outcome.stats.failed >= 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_terminates() {
    let temp = create_test_tree();
    std::os::unix::fs::symlink(temp.path(), temp.path().join("loop")).unwrap();

    let outcome = scan(&ScanOptions::new(temp.path()));

    let link = outcome
        .root
        .children
        .iter()
        .find(|e| e.name == "loop")
        .unwrap();
    assert_eq!(link.entity_type, EntityKind::Other);
    assert_eq!(link.error_message.as_deref(), Some(SYMLINK_MESSAGE));
    assert!(link.children.is_empty());
    assert_eq!(outcome.stats.others, 1);
    // The loop added one entity, nothing was followed
    assert_eq!(outcome.root.entity_count(), 8);
}

#[cfg(unix)]
#[test]
fn test_permissions_survive_into_entities() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mode.txt");
    write_file(&path, b"x");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    let outcome = scan(&ScanOptions::new(temp.path()));
    let entity = outcome
        .root
        .children
        .iter()
        .find(|e| e.name == "mode.txt")
        .unwrap();
    assert_eq!(entity.permissions, 0o640);
}
