use dupscan::duplicates::{DuplicateFinder, ErrorPolicy, FinderConfig, FinderError, ScanStrategy};
use dupscan::scanner::DiagnosticKind;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Tree with one duplicate pair and a directory nobody can list.
///
/// Returns `None` when permissions are not enforced (running as root).
#[cfg(unix)]
fn tree_with_locked_dir() -> Option<TempDir> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();

    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), b"dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        eprintln!("skipping: directory permissions are not enforced for this user");
        unlock(dir.path());
        return None;
    }
    Some(dir)
}

#[cfg(unix)]
fn unlock(root: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    let Some(dir) = tree_with_locked_dir() else {
        return;
    };

    let result = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    unlock(dir.path());
    let report = result.unwrap();

    let dupes = report.grouping.duplicate_groups();
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes[0].len(), 2);

    assert_eq!(report.summary.skipped.len(), 1);
    assert_eq!(report.summary.skipped_subtrees(), 1);
    assert_eq!(report.summary.skipped[0].kind, DiagnosticKind::Traversal);
    assert_eq!(report.summary.skipped[0].path, dir.path().join("locked"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_sequential() {
    let Some(dir) = tree_with_locked_dir() else {
        return;
    };

    let result = DuplicateFinder::new(
        FinderConfig::default().with_strategy(ScanStrategy::Sequential),
    )
    .find_duplicates(dir.path());
    unlock(dir.path());
    let report = result.unwrap();

    assert_eq!(report.summary.duplicate_groups, 1);
    assert_eq!(report.summary.skipped_subtrees(), 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_strict_fails() {
    let Some(dir) = tree_with_locked_dir() else {
        return;
    };

    let result = DuplicateFinder::new(FinderConfig::default().with_error_policy(ErrorPolicy::Abort))
        .find_duplicates(dir.path());
    unlock(dir.path());

    match result {
        Err(FinderError::Traversal { path, message }) => {
            assert_eq!(path, dir.path().join("locked"));
            assert!(message.contains("Permission denied"));
        }
        other => panic!("Expected Traversal error, got: {:?}", other.map(|r| r.summary)),
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();
    let secret = dir.path().join("secret.txt");
    fs::write(&secret, b"dup").unwrap();
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read(&secret).is_ok() {
        eprintln!("skipping: file permissions are not enforced for this user");
        return;
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.files_hashed, 2);
    assert_eq!(report.summary.skipped_files(), 1);
    assert_eq!(report.summary.skipped[0].kind, DiagnosticKind::Hash);
    assert_eq!(report.summary.skipped[0].path, secret);
    assert_eq!(report.grouping.duplicate_groups()[0].len(), 2);
}

/// Tree with one duplicate pair and a subtree nested past `PATH_MAX`.
///
/// Listing the deepest reachable level fails with `ENAMETOOLONG` for every
/// user, root included. Returns the first directory that cannot be listed.
#[cfg(unix)]
fn tree_with_overlong_subtree(dir: &TempDir) -> PathBuf {
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();

    let chain = dir.path().join("chain");
    fs::create_dir(&chain).unwrap();
    let names = ["a".repeat(200), "b".repeat(200)];
    fs::create_dir(chain.join(&names[0])).unwrap();
    for level in 1..30 {
        let top = &names[(level + 1) % 2];
        let next = &names[level % 2];
        fs::create_dir(chain.join(next)).unwrap();
        fs::rename(chain.join(top), chain.join(next).join(top)).unwrap();
    }

    let mut path = chain;
    loop {
        let Ok(mut entries) = fs::read_dir(&path) else {
            return path;
        };
        path = entries.next().unwrap().unwrap().path();
    }
}

#[cfg(unix)]
#[test]
fn test_overlong_subtree_is_skipped() {
    let dir = tempdir().unwrap();
    let unlistable = tree_with_overlong_subtree(&dir);

    for strategy in [ScanStrategy::Concurrent, ScanStrategy::Sequential] {
        let report = DuplicateFinder::new(FinderConfig::default().with_strategy(strategy))
            .find_duplicates(dir.path())
            .unwrap();

        assert_eq!(report.summary.duplicate_groups, 1);
        assert_eq!(report.summary.skipped.len(), 1);
        assert_eq!(report.summary.skipped_subtrees(), 1);
        assert_eq!(report.summary.skipped[0].path, unlistable);
    }
}

#[cfg(unix)]
#[test]
fn test_overlong_subtree_directory_counts_agree() {
    let dir = tempdir().unwrap();
    tree_with_overlong_subtree(&dir);

    let concurrent = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let sequential = DuplicateFinder::new(
        FinderConfig::default().with_strategy(ScanStrategy::Sequential),
    )
    .find_duplicates(dir.path())
    .unwrap();

    assert_eq!(concurrent.summary.directories, sequential.summary.directories);
}

#[cfg(unix)]
#[test]
fn test_overlong_subtree_strict_fails() {
    let dir = tempdir().unwrap();
    let unlistable = tree_with_overlong_subtree(&dir);

    for strategy in [ScanStrategy::Concurrent, ScanStrategy::Sequential] {
        let result = DuplicateFinder::new(
            FinderConfig::default()
                .with_strategy(strategy)
                .with_error_policy(ErrorPolicy::Abort),
        )
        .find_duplicates(dir.path());

        match result {
            Err(FinderError::Traversal { path, .. }) => assert_eq!(path, unlistable),
            other => panic!("Expected Traversal error, got: {:?}", other.map(|r| r.summary)),
        }
    }
}

#[test]
fn test_root_errors_are_reported_before_scanning() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, b"data").unwrap();

    let finder = DuplicateFinder::with_defaults();

    let err = finder.find_duplicates(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, FinderError::PathNotFound(_)));
    assert!(err.is_usage_error());

    let err = finder.find_duplicates(&file).unwrap_err();
    assert!(matches!(err, FinderError::NotADirectory(_)));
    assert!(err.is_usage_error());
}
