use dupscan::duplicates::{DuplicateFinder, FinderConfig, ScanState, ScanStrategy};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let report = finder.find_duplicates(dir.path()).unwrap();

    assert!(report.grouping.is_empty());
    assert_eq!(report.summary.files_hashed, 0);
    assert_eq!(report.summary.duplicate_groups, 0);
    assert_eq!(report.summary.directories, 1);
    assert_eq!(finder.state(), ScanState::Done);
}

#[test]
fn test_scan_identical_content_across_directories() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"X").unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("b").join("b.txt"), b"X").unwrap();
    fs::write(dir.path().join("c.txt"), b"Y").unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let dupes = report.grouping.duplicate_groups();
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes[0].len(), 2);
    assert_eq!(dupes[0].fingerprint, blake3::hash(b"X").to_hex().to_string());

    let members: BTreeSet<PathBuf> = dupes[0].paths.iter().cloned().collect();
    let expected: BTreeSet<PathBuf> = [
        dir.path().join("a.txt"),
        dir.path().join("b").join("b.txt"),
    ]
    .into_iter()
    .collect();
    assert_eq!(members, expected);

    // The unique file is grouped on its own and never reported
    assert_eq!(report.grouping.len(), 2);
    assert!(dupes
        .iter()
        .all(|g| !g.paths.contains(&dir.path().join("c.txt"))));
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(format!("content {}", name).as_bytes())
            .unwrap();
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.grouping.duplicate_groups().is_empty());
    assert_eq!(report.summary.files_hashed, 3);
    assert_eq!(report.grouping.len(), 3);
}

#[test]
fn test_scan_only_empty_files() {
    let dir = tempdir().unwrap();
    for i in 0..10_000 {
        File::create(dir.path().join(format!("empty_{}", i))).unwrap();
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.grouping.is_empty());
    assert_eq!(report.summary.files_hashed, 0);
    assert!(report.summary.skipped.is_empty());
}

#[test]
fn test_scan_deep_tree() {
    let dir = tempdir().unwrap();
    let mut path = dir.path().to_path_buf();
    for depth in 0..40 {
        path = path.join(format!("level_{}", depth));
        fs::create_dir(&path).unwrap();
        fs::write(path.join("same.bin"), b"deep duplicate").unwrap();
    }

    let report = DuplicateFinder::new(FinderConfig::default().with_admission_capacity(2))
        .find_duplicates(dir.path())
        .unwrap();

    let dupes = report.grouping.duplicate_groups();
    assert_eq!(dupes.len(), 1);
    assert_eq!(dupes[0].len(), 40);
    assert_eq!(report.summary.directories, 41);
    assert_eq!(report.summary.duplicate_files, 39);
}

#[test]
fn test_capacity_does_not_change_partition() {
    let dir = tempdir().unwrap();
    for d in 0..6 {
        let sub = dir.path().join(format!("dir_{}", d));
        fs::create_dir(&sub).unwrap();
        for f in 0..12 {
            fs::write(sub.join(format!("f{}", f)), format!("payload {}", (d * f) % 7)).unwrap();
        }
    }

    let one = DuplicateFinder::new(FinderConfig::default().with_admission_capacity(1))
        .find_duplicates(dir.path())
        .unwrap();
    let many = DuplicateFinder::new(
        FinderConfig::default()
            .with_threads(8)
            .with_admission_capacity(64),
    )
    .find_duplicates(dir.path())
    .unwrap();
    let sequential = DuplicateFinder::new(
        FinderConfig::default().with_strategy(ScanStrategy::Sequential),
    )
    .find_duplicates(dir.path())
    .unwrap();

    assert_eq!(one.grouping.partition(), many.grouping.partition());
    assert_eq!(one.grouping.partition(), sequential.grouping.partition());
    assert_eq!(one.summary.files_hashed, 72);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        fs::write(dir.path().join(format!("file_{}", i)), format!("{}", i % 4)).unwrap();
    }

    let finder = DuplicateFinder::with_defaults();
    let first = finder.find_duplicates(dir.path()).unwrap();
    let second = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.grouping.partition(), second.grouping.partition());
    assert_eq!(first.summary.duplicate_groups, 4);
}

#[test]
fn test_bytes_hashed_counts_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), vec![0u8; 100_000]).unwrap();
    fs::write(dir.path().join("b"), vec![0u8; 100_000]).unwrap();
    fs::write(dir.path().join("c"), b"abc").unwrap();

    let report = DuplicateFinder::new(FinderConfig::default().with_buffer_size(4096))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.bytes_hashed, 200_003);
    assert_eq!(report.summary.duplicate_groups, 1);
}
