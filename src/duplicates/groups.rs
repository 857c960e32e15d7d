//! Fingerprint grouping.
//!
//! # Overview
//!
//! A [`Grouping`] maps each fingerprint to the paths that produced it, in
//! the order the records arrived. Arrival order is whatever the concurrent
//! scan happened to produce, so it is not stable between runs; group
//! *membership* is. Groups with more than one path are duplicates.
//!
//! # Example
//!
//! ```
//! use dupscan::duplicates::Grouping;
//! use dupscan::scanner::FileRecord;
//! use std::path::PathBuf;
//!
//! let mut grouping = Grouping::new();
//! grouping.insert(FileRecord::new("aa".into(), PathBuf::from("/a.txt"), 1));
//! grouping.insert(FileRecord::new("aa".into(), PathBuf::from("/b/b.txt"), 1));
//! grouping.insert(FileRecord::new("bb".into(), PathBuf::from("/c.txt"), 1));
//!
//! assert_eq!(grouping.total_files(), 3);
//! let dupes = grouping.duplicate_groups();
//! assert_eq!(dupes.len(), 1);
//! assert_eq!(dupes[0].len(), 2);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::{short_fingerprint, FileRecord};

/// Mapping from fingerprint to the paths sharing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    groups: HashMap<String, Vec<PathBuf>>,
    files: usize,
}

impl Grouping {
    /// Create an empty grouping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record's path to the group for its fingerprint.
    pub fn insert(&mut self, record: FileRecord) {
        self.groups
            .entry(record.fingerprint)
            .or_default()
            .push(record.path);
        self.files += 1;
    }

    /// Paths recorded for `fingerprint`, in arrival order.
    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<&[PathBuf]> {
        self.groups.get(fingerprint).map(Vec::as_slice)
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no file was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of recorded paths across all groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.files
    }

    /// Iterate over `(fingerprint, paths)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups
            .iter()
            .map(|(fingerprint, paths)| (fingerprint.as_str(), paths.as_slice()))
    }

    /// Groups with two or more paths.
    ///
    /// Sorted by descending size, then by fingerprint, so reports are stable
    /// even though arrival order is not.
    #[must_use]
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        let mut dupes: Vec<DuplicateGroup> = self
            .groups
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(fingerprint, paths)| DuplicateGroup::new(fingerprint.clone(), paths.clone()))
            .collect();

        dupes.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        dupes
    }

    /// Group membership as a set of path sets, ignoring fingerprints and
    /// arrival order. Two scans of the same tree have equal partitions.
    #[must_use]
    pub fn partition(&self) -> BTreeSet<BTreeSet<PathBuf>> {
        self.groups
            .values()
            .map(|paths| paths.iter().cloned().collect())
            .collect()
    }
}

impl FromIterator<FileRecord> for Grouping {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut grouping = Self::new();
        for record in iter {
            grouping.insert(record);
        }
        grouping
    }
}

/// Files sharing one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Content fingerprint shared by every path
    pub fingerprint: String,
    /// Paths in arrival order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(fingerprint: String, paths: Vec<PathBuf>) -> Self {
        Self { fingerprint, paths }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// First path that arrived for this fingerprint.
    #[must_use]
    pub fn representative(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// Trailing `len` characters of the fingerprint.
    #[must_use]
    pub fn short_fingerprint(&self, len: usize) -> &str {
        short_fingerprint(&self.fingerprint, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fp: &str, path: &str) -> FileRecord {
        FileRecord::new(fp.to_string(), PathBuf::from(path), 1)
    }

    #[test]
    fn test_empty_grouping() {
        let grouping = Grouping::new();
        assert!(grouping.is_empty());
        assert_eq!(grouping.len(), 0);
        assert_eq!(grouping.total_files(), 0);
        assert!(grouping.duplicate_groups().is_empty());
    }

    #[test]
    fn test_insert_preserves_arrival_order() {
        let mut grouping = Grouping::new();
        grouping.insert(record("f1", "/z"));
        grouping.insert(record("f1", "/a"));
        grouping.insert(record("f1", "/m"));

        assert_eq!(
            grouping.get("f1").unwrap(),
            &[PathBuf::from("/z"), PathBuf::from("/a"), PathBuf::from("/m")]
        );
        assert!(grouping.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_groups_excludes_singletons_and_sorts() {
        let grouping: Grouping = vec![
            record("bb", "/1"),
            record("bb", "/2"),
            record("aa", "/3"),
            record("aa", "/4"),
            record("cc", "/5"),
            record("cc", "/6"),
            record("cc", "/7"),
            record("dd", "/8"),
        ]
        .into_iter()
        .collect();

        assert_eq!(grouping.len(), 4);
        assert_eq!(grouping.total_files(), 8);

        let dupes = grouping.duplicate_groups();
        let order: Vec<_> = dupes.iter().map(|g| g.fingerprint.as_str()).collect();
        assert_eq!(order, vec!["cc", "aa", "bb"]);
        assert_eq!(dupes[0].representative(), Some(Path::new("/5")));
    }

    #[test]
    fn test_partition_ignores_order() {
        let a: Grouping = vec![record("x", "/a"), record("x", "/b"), record("y", "/c")]
            .into_iter()
            .collect();
        let b: Grouping = vec![record("y", "/c"), record("x", "/b"), record("x", "/a")]
            .into_iter()
            .collect();

        assert_ne!(a, b);
        assert_eq!(a.partition(), b.partition());
    }

    #[test]
    fn test_short_fingerprint() {
        let group = DuplicateGroup::new("0123456789abcdef".to_string(), vec![]);
        assert_eq!(group.short_fingerprint(7), "9abcdef");
        assert!(group.is_empty());
        assert!(group.representative().is_none());
    }
}
