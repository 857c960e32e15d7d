use dupscan::duplicates::DuplicateFinder;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_unicode_and_space_names() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("résumé final.txt"), b"same").unwrap();
    fs::create_dir(dir.path().join("日本語")).unwrap();
    fs::write(dir.path().join("日本語").join("ファイル.txt"), b"same").unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let dupes = report.grouping.duplicate_groups();
    assert_eq!(dupes.len(), 1);
    assert!(dupes[0]
        .paths
        .contains(&dir.path().join("日本語").join("ファイル.txt")));
}

#[test]
fn test_root_with_dot_component() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"1").unwrap();
    fs::write(dir.path().join("b"), b"1").unwrap();

    // A root with a trailing `.` component still resolves to the same tree
    let report = DuplicateFinder::with_defaults()
        .find_duplicates(&dir.path().join("."))
        .unwrap();

    assert_eq!(report.summary.duplicate_groups, 1);
    assert_eq!(report.summary.directories, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    fs::write(real.join("data.bin"), b"payload").unwrap();
    fs::write(dir.path().join("copy.bin"), b"payload").unwrap();

    std::os::unix::fs::symlink(real.join("data.bin"), dir.path().join("file_link")).unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("dir_link")).unwrap();
    // A cycle must not hang the scan
    std::os::unix::fs::symlink(dir.path(), real.join("loop")).unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.files_hashed, 2);
    assert_eq!(report.summary.directories, 2);
    let dupes = report.grouping.duplicate_groups();
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes[0].len(), 2);
}

#[cfg(unix)]
#[test]
fn test_fifo_is_ignored() {
    use std::process::Command;

    let dir = tempdir().unwrap();
    let fifo = dir.path().join("pipe");
    let made = Command::new("mkfifo").arg(&fifo).status();
    if !made.map(|s| s.success()).unwrap_or(false) {
        return;
    }
    fs::write(dir.path().join("a"), b"x").unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.files_hashed, 1);
    assert!(report.summary.skipped.is_empty());
}
