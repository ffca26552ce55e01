use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stocktake_core::{AccessLog, Inventory, ScanConfig};
use stocktake_ops::{Mutation, MutationError, MutationService};
use stocktake_scan::Walker;
use tempfile::TempDir;

struct Fixture {
    tree: TempDir,
    logs: TempDir,
    log: Arc<AccessLog>,
}

impl Fixture {
    /// `a.txt`, `b/`, `b/c.txt`, `z.txt`
    fn new() -> Self {
        let tree = TempDir::new().unwrap();
        let logs = TempDir::new().unwrap();
        let root = tree.path();
        fs::write(root.join("a.txt"), vec![b'a'; 4096]).unwrap();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("b/c.txt"), b"c").unwrap();
        fs::write(root.join("z.txt"), b"zz").unwrap();

        let log = Arc::new(AccessLog::open(logs.path().join("access.log")));
        Self { tree, logs, log }
    }

    fn root(&self) -> PathBuf {
        self.tree.path().canonicalize().unwrap()
    }

    fn scan(&self) -> Inventory {
        Walker::new(ScanConfig::new(self.root()), Arc::clone(&self.log))
            .scan_all()
            .unwrap()
            .into_inventory()
    }

    fn service(&self) -> MutationService {
        MutationService::new(Arc::clone(&self.log), 4096)
    }

    fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.logs.path().join("access.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn position(inventory: &Inventory, path: &Path) -> Option<usize> {
    inventory.entries().iter().position(|e| e.path == path)
}

#[test]
fn test_rename_refreshes_entry_in_place() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let source = fx.root().join("a.txt");
    let before = position(&inventory, &source).unwrap();

    let target = fx
        .service()
        .rename(&mut inventory, &source, "zzz.txt")
        .unwrap();

    assert_eq!(target, fx.root().join("zzz.txt"));
    assert!(target.exists());
    assert!(!source.exists());
    assert!(inventory.find_by_path(&source).is_none());
    // not re-sorted: keeps the slot a.txt had
    assert_eq!(position(&inventory, &target), Some(before));

    let entry = inventory.find_by_path(&target).unwrap();
    assert_eq!(entry.name.as_str(), "zzz.txt");
    assert_eq!(entry.size_display(), "4096/4096");

    let lines = fx.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("MODIFIED rename"));
}

#[test]
fn test_rename_onto_existing_name_fails() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let source = fx.root().join("a.txt");
    let original = inventory.find_by_path(&source).unwrap().clone();

    let err = fx
        .service()
        .rename(&mut inventory, &source, "z.txt")
        .unwrap_err();

    assert!(matches!(err, MutationError::TargetExists { .. }));
    assert_eq!(inventory.find_by_path(&source), Some(&original));
    assert_eq!(fs::read(&source).unwrap().len(), 4096);
    assert_eq!(fs::read(fx.root().join("z.txt")).unwrap(), b"zz");

    let failed: Vec<_> = fx
        .log_lines()
        .into_iter()
        .filter(|l| l.contains("FAILED rename"))
        .collect();
    assert_eq!(failed.len(), 1);
}

#[test]
fn test_rename_rejects_invalid_name() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let source = fx.root().join("a.txt");

    for bad in ["", "x/y", ".."] {
        let err = fx
            .service()
            .rename(&mut inventory, &source, bad)
            .unwrap_err();
        assert!(matches!(err, MutationError::RenameFailed { .. }), "{bad:?}");
    }
    assert!(source.exists());
}

#[test]
fn test_rename_unknown_entry() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let stray = fx.root().join("not-scanned");
    fs::write(&stray, b"x").unwrap();

    let err = fx
        .service()
        .rename(&mut inventory, &stray, "renamed")
        .unwrap_err();
    assert!(matches!(err, MutationError::EntryNotFound { .. }));
    assert!(stray.exists());
}

#[test]
fn test_chmod_with_short_string_leaves_entry_unchanged() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let path = fx.root().join("a.txt");
    let original = inventory.find_by_path(&path).unwrap().clone();

    let err = fx
        .service()
        .chmod(&mut inventory, &path, "rwxr-xr-")
        .unwrap_err();

    assert!(matches!(err, MutationError::InvalidPermissionFormat { .. }));
    assert_eq!(inventory.find_by_path(&path), Some(&original));

    let lines = fx.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("FAILED chmod"));
    assert!(lines[0].contains("expected 10 characters"));
}

#[cfg(unix)]
#[test]
fn test_chmod_updates_disk_and_entry() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let path = fx.root().join("b/c.txt");
    let before = position(&inventory, &path).unwrap();

    fx.service()
        .chmod(&mut inventory, &path, "-rw-------")
        .unwrap();

    let on_disk = fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
    assert_eq!(on_disk, 0o600);

    let entry = inventory.find_by_path(&path).unwrap();
    assert_eq!(entry.permissions.as_str(), "-rw-------");
    assert_eq!(entry.mode_bits(), 0o600);
    assert_eq!(position(&inventory, &path), Some(before));

    let lines = fx.log_lines();
    assert!(lines[0].contains("MODIFIED chmod"));
    assert!(lines[0].contains("permissions now -rw-------"));
}

#[cfg(unix)]
#[test]
fn test_chmod_sets_sticky_bit_on_directory() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let dir = fx.root().join("b");

    fx.service()
        .chmod(&mut inventory, &dir, "drwxr-x--T")
        .unwrap();

    let entry = inventory.find_by_path(&dir).unwrap();
    assert_eq!(entry.permissions.as_str(), "drwxr-x--T");
    assert_eq!(entry.mode_bits(), 0o1750);
    assert!(entry.is_dir);
}

#[cfg(unix)]
#[test]
fn test_chmod_refuses_symlinks() {
    let fx = Fixture::new();
    std::os::unix::fs::symlink(fx.root().join("a.txt"), fx.root().join("link")).unwrap();
    let mut inventory = fx.scan();
    let link = fx.root().join("link");

    let err = fx
        .service()
        .chmod(&mut inventory, &link, "lrwx------")
        .unwrap_err();
    assert!(matches!(err, MutationError::ChmodFailed { .. }));
}

#[test]
fn test_apply_dispatches() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let mut service = fx.service();
    let source = fx.root().join("z.txt");

    let renamed = service
        .apply(&mut inventory, &source, &Mutation::rename("y.txt"))
        .unwrap();
    assert_eq!(renamed, fx.root().join("y.txt"));

    let err = service
        .apply(&mut inventory, &renamed, &Mutation::chmod("-rw-rw-rw"))
        .unwrap_err();
    assert!(matches!(err, MutationError::InvalidPermissionFormat { .. }));
    assert_eq!(fx.log_lines().len(), 2);
}

#[test]
fn test_rescan_restores_order_after_rename() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    fx.service()
        .rename(&mut inventory, &fx.root().join("z.txt"), "0.txt")
        .unwrap();

    let fresh = fx.scan();
    let names: Vec<_> = fresh.entries().iter().map(|e| e.name.to_string()).collect();
    assert_eq!(names, ["b", "0.txt", "a.txt", "c.txt"]);
}

#[test]
fn test_rename_onto_stale_inventory_entry_fails() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let source = fx.root().join("a.txt");
    let stale = fx.root().join("z.txt");
    fs::remove_file(&stale).unwrap();

    let err = fx
        .service()
        .rename(&mut inventory, &source, "z.txt")
        .unwrap_err();

    assert!(matches!(err, MutationError::TargetExists { .. }));
    assert!(source.exists());
    assert!(inventory.find_by_path(&source).is_some());
    let sharing = inventory.entries().iter().filter(|e| e.path == stale).count();
    assert_eq!(sharing, 1);
}

#[test]
fn test_rename_of_vanished_entry_reports_os_error() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let source = fx.root().join("a.txt");
    let original = inventory.find_by_path(&source).unwrap().clone();
    fs::remove_file(&source).unwrap();

    let err = fx
        .service()
        .rename(&mut inventory, &source, "moved.txt")
        .unwrap_err();

    match &err {
        MutationError::RenameFailed { reason, .. } => {
            assert!(reason.contains("No such file"), "{reason}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(inventory.find_by_path(&source), Some(&original));
    assert!(inventory.find_by_path(&fx.root().join("moved.txt")).is_none());

    let lines = fx.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("FAILED rename"));
}

#[test]
fn test_chmod_of_vanished_entry_reports_os_error() {
    let fx = Fixture::new();
    let mut inventory = fx.scan();
    let path = fx.root().join("b/c.txt");
    let original = inventory.find_by_path(&path).unwrap().clone();
    fs::remove_file(&path).unwrap();

    let err = fx
        .service()
        .chmod(&mut inventory, &path, "-rw-------")
        .unwrap_err();

    assert!(matches!(err, MutationError::ChmodFailed { .. }));
    assert_eq!(inventory.find_by_path(&path), Some(&original));

    let lines = fx.log_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("FAILED chmod"));
}
