//! Duplicate file detection using content fingerprints.
//!
//! Every candidate is fingerprinted once; files are then partitioned by
//! digest. Partitions with two or more members become [`DuplicateGroup`]s.
//!
//! Hashing may run on the rayon pool, but results are gathered back into
//! input order before grouping, so output never depends on thread timing:
//! members keep discovery order and groups appear in the order their first
//! member was discovered.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tidyfile_core::{
    Event, FailureKind, FileFailure, FileRecord, Fingerprint, Reporter, TidyError,
    DEFAULT_CHUNK_SIZE,
};

use crate::fingerprint::Fingerprinter;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DuplicateConfig {
    /// Read buffer size for fingerprinting.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Hash files on the rayon pool.
    #[builder(default = "true")]
    pub parallel: bool,

    /// Minimum file size to consider. Zero includes empty files.
    #[builder(default = "0")]
    pub min_size: u64,
}

impl DuplicateConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.chunk_size {
            Some(0) => Err("chunk_size must be greater than zero".to_string()),
            _ => Ok(()),
        }
    }
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: true,
            min_size: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// A group of files sharing the same content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Fingerprint shared by all members.
    pub fingerprint: Fingerprint,

    /// Size of each file in bytes.
    pub size: u64,

    /// Members in discovery order. Never fewer than two, no repeated paths.
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Get the number of duplicate files.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// If keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Bytes reclaimable by keeping one copy: size * (count - 1).
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.deletable_count() as u64
    }

    /// Whether `path` is one of the members.
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m.path() == path)
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups in first-discovery order.
    pub groups: Vec<DuplicateGroup>,

    /// Files that could not be fingerprinted.
    pub failures: Vec<FileFailure>,

    /// Number of files fingerprinted successfully.
    pub files_analyzed: u64,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of duplicate groups.
    pub group_count: usize,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Get total number of files across all groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::count).sum()
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
    fingerprinter: Fingerprinter,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self::with_config(DuplicateConfig::default())
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        let fingerprinter = Fingerprinter::with_chunk_size(config.chunk_size);
        Self {
            config,
            fingerprinter,
        }
    }

    /// Partition `records` by content and return groups of two or more.
    ///
    /// A repeated file is only considered at its first position, where two
    /// paths name the same file if they resolve to the same canonical path.
    /// This keeps a symlink and its target out of one group. Files that
    /// cannot be read are left out of every group and listed in
    /// [`DuplicateReport::failures`].
    pub fn group(&self, records: &[FileRecord], reporter: &dyn Reporter) -> DuplicateReport {
        let mut seen = HashSet::new();
        let candidates: Vec<&FileRecord> = records
            .iter()
            .filter(|r| seen.insert(file_identity(r.path())))
            .filter(|r| r.size() >= self.config.min_size)
            .collect();

        let hashed = self.fingerprint_all(&candidates);

        let mut partitions: IndexMap<Fingerprint, Vec<FileRecord>> = IndexMap::new();
        let mut failures = Vec::new();
        let mut files_analyzed = 0u64;

        for (record, result) in candidates.into_iter().zip(hashed) {
            match result {
                Ok(fingerprint) => {
                    files_analyzed += 1;
                    reporter.report(&Event::Fingerprinted {
                        path: record.path(),
                        fingerprint: &fingerprint,
                    });
                    partitions.entry(fingerprint).or_default().push(record.clone());
                }
                Err(err) => {
                    let failure =
                        FileFailure::new(record.path(), err.to_string(), FailureKind::Read);
                    reporter.report(&Event::Failed { failure: &failure });
                    failures.push(failure);
                }
            }
        }

        let groups: Vec<DuplicateGroup> = partitions
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(fingerprint, members)| DuplicateGroup {
                fingerprint,
                size: members[0].size(),
                members,
            })
            .collect();

        for group in &groups {
            reporter.report(&Event::DuplicateGroup {
                fingerprint: &group.fingerprint,
                members: group.count(),
            });
        }

        let total_wasted_space = groups.iter().map(DuplicateGroup::wasted_bytes).sum();
        let group_count = groups.len();

        DuplicateReport {
            groups,
            failures,
            files_analyzed,
            total_wasted_space,
            group_count,
        }
    }

    /// Fingerprint each candidate; output is index-aligned with the input.
    fn fingerprint_all(&self, candidates: &[&FileRecord]) -> Vec<Result<Fingerprint, TidyError>> {
        if self.config.parallel {
            candidates
                .par_iter()
                .map(|r| self.fingerprinter.fingerprint(r.path()))
                .collect()
        } else {
            candidates
                .iter()
                .map(|r| self.fingerprinter.fingerprint(r.path()))
                .collect()
        }
    }
}

/// Canonical path of `path`, or the path itself when it cannot be resolved.
fn file_identity(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;
    use tidyfile_core::{EventKind, NullReporter, RecordingReporter};

    fn record(path: impl AsRef<Path>) -> FileRecord {
        FileRecord::from_path(path.as_ref()).unwrap()
    }

    fn create_test_files() -> (TempDir, Vec<FileRecord>) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.txt"), "duplicate content here").unwrap();
        fs::write(root.join("file2.txt"), "unique content").unwrap();
        fs::write(root.join("file3.txt"), "duplicate content here").unwrap();
        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/file4.txt"), "duplicate content here").unwrap();

        let records = ["file1.txt", "file2.txt", "file3.txt", "subdir/file4.txt"]
            .iter()
            .map(|n| record(root.join(n)))
            .collect();
        (temp, records)
    }

    #[test]
    fn test_groups_identical_content() {
        let (_temp, records) = create_test_files();
        let report = DuplicateFinder::new().group(&records, &NullReporter);

        assert_eq!(report.group_count, 1);
        assert_eq!(report.files_analyzed, 4);
        let group = &report.groups[0];
        assert_eq!(group.count(), 3);
        assert_eq!(group.members[0].path(), records[0].path());
        assert_eq!(group.members[1].path(), records[2].path());
        assert_eq!(group.members[2].path(), records[3].path());
        assert_eq!(group.wasted_bytes(), 22 * 2);
        assert_eq!(report.total_wasted_space, 44);
    }

    #[test]
    fn test_repeated_paths_are_counted_once() {
        let (_temp, records) = create_test_files();
        let doubled = vec![records[0].clone(), records[0].clone(), records[1].clone()];
        let report = DuplicateFinder::new().group(&doubled, &NullReporter);
        assert!(!report.has_duplicates());
        assert_eq!(report.files_analyzed, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_and_target_are_one_file() {
        let (temp, records) = create_test_files();
        let link = temp.path().join("l.txt");
        std::os::unix::fs::symlink(records[1].path(), &link).unwrap();

        let with_link = vec![records[1].clone(), record(&link)];
        let report = DuplicateFinder::new().group(&with_link, &NullReporter);
        assert!(!report.has_duplicates());
        assert_eq!(report.files_analyzed, 1);
    }

    #[test]
    fn test_unreadable_file_is_reported_not_fatal() {
        let (temp, mut records) = create_test_files();
        records.push(FileRecord::new(
            temp.path().join("vanished.txt"),
            22,
            SystemTime::now(),
        ));

        let reporter = RecordingReporter::new();
        let report = DuplicateFinder::new().group(&records, &reporter);

        assert_eq!(report.group_count, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Read);
        assert!(!report.groups[0].contains(&temp.path().join("vanished.txt")));
        assert_eq!(reporter.count(EventKind::Failed), 1);
        assert_eq!(reporter.count(EventKind::Fingerprinted), 4);
    }

    #[test]
    fn test_min_size_filter() {
        let (_temp, records) = create_test_files();
        let config = DuplicateConfig::builder().min_size(100u64).build().unwrap();
        let report = DuplicateFinder::with_config(config).group(&records, &NullReporter);
        assert_eq!(report.files_analyzed, 0);
        assert!(!report.has_duplicates());
    }

    #[test]
    fn test_config_rejects_zero_chunk() {
        assert!(DuplicateConfig::builder().chunk_size(0usize).build().is_err());
    }
}
