//! Deletion collaborator.
//!
//! Components decide *which* records to delete; a [`Deleter`] performs the
//! filesystem side effect. Every caller goes through [`delete_records`], so
//! the dry-run gate lives in exactly one place.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use tidyfile_core::{Event, FailureKind, FileFailure, FileRecord, Reporter};

use crate::progress::{OperationComplete, OperationType};

/// Removes one file from disk.
pub trait Deleter: Send + Sync {
    /// Delete the file a record points at.
    fn delete(&self, record: &FileRecord) -> io::Result<()>;
}

/// Deletes with `std::fs`, or moves to the OS trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDeleter {
    use_trash: bool,
}

impl FsDeleter {
    /// Unlink files permanently.
    pub fn permanent() -> Self {
        Self { use_trash: false }
    }

    /// Send files to the trash / recycle bin.
    pub fn trash() -> Self {
        Self { use_trash: true }
    }

    /// Pick trash or permanent deletion.
    pub fn new(use_trash: bool) -> Self {
        Self { use_trash }
    }
}

impl Deleter for FsDeleter {
    fn delete(&self, record: &FileRecord) -> io::Result<()> {
        if self.use_trash {
            trash::delete(record.path()).map_err(|e| io::Error::other(e.to_string()))
        } else {
            std::fs::remove_file(record.path())
        }
    }
}

/// What a deletion pass did (or would do).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Files removed from disk.
    pub deleted: Vec<PathBuf>,
    /// Files a non-dry run would remove.
    pub would_delete: Vec<PathBuf>,
    /// Files whose deletion failed. Never retried.
    pub failed: Vec<FileFailure>,
}

impl DeletionReport {
    /// Number of files touched or that would be touched.
    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.would_delete.len() + self.failed.len()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: DeletionReport) {
        self.deleted.extend(other.deleted);
        self.would_delete.extend(other.would_delete);
        self.failed.extend(other.failed);
    }

    /// Completion summary for display.
    pub fn complete(&self, dry_run: bool) -> OperationComplete {
        OperationComplete {
            operation_type: OperationType::Delete,
            dry_run,
            succeeded: if dry_run {
                self.would_delete.len()
            } else {
                self.deleted.len()
            },
            failed: self.failed.len(),
            skipped: 0,
        }
    }
}

/// Delete `records` through `deleter`, or only report them when `dry_run`.
///
/// A failure is recorded and the pass moves on to the next record.
pub fn delete_records<'a>(
    records: impl IntoIterator<Item = &'a FileRecord>,
    deleter: &dyn Deleter,
    dry_run: bool,
    reporter: &dyn Reporter,
) -> DeletionReport {
    let mut report = DeletionReport::default();

    for record in records {
        if dry_run {
            reporter.report(&Event::WouldDelete {
                path: record.path(),
            });
            report.would_delete.push(record.path().to_path_buf());
            continue;
        }

        match deleter.delete(record) {
            Ok(()) => {
                reporter.report(&Event::Deleted {
                    path: record.path(),
                });
                report.deleted.push(record.path().to_path_buf());
            }
            Err(err) => {
                let failure = FileFailure::from_io(record.path(), &err, FailureKind::Delete);
                reporter.report(&Event::Failed { failure: &failure });
                report.failed.push(failure);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tidyfile_core::{EventKind, NullReporter, RecordingReporter};

    fn touch(temp: &TempDir, name: &str) -> FileRecord {
        let path = temp.path().join(name);
        fs::write(&path, name).unwrap();
        FileRecord::from_path(path).unwrap()
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let records = vec![touch(&temp, "a"), touch(&temp, "b")];
        let reporter = RecordingReporter::new();

        let report = delete_records(&records, &FsDeleter::permanent(), true, &reporter);

        assert!(report.deleted.is_empty());
        assert_eq!(report.would_delete.len(), 2);
        assert!(records.iter().all(|r| r.path().exists()));
        assert_eq!(reporter.count(EventKind::WouldDelete), 2);
        assert_eq!(reporter.count(EventKind::Deleted), 0);
    }

    #[test]
    fn test_permanent_delete_and_failure() {
        let temp = TempDir::new().unwrap();
        let present = touch(&temp, "present");
        let gone = FileRecord::new(temp.path().join("gone"), 0, std::time::SystemTime::now());

        let report = delete_records(
            [&present, &gone],
            &FsDeleter::permanent(),
            false,
            &NullReporter,
        );

        assert_eq!(report.deleted, vec![present.path().to_path_buf()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kind, FailureKind::Delete);
        assert!(!present.path().exists());
        assert_eq!(report.attempted(), 2);
    }

    #[test]
    fn test_completion_summary() {
        let report = DeletionReport {
            deleted: vec![PathBuf::from("/a")],
            would_delete: Vec::new(),
            failed: Vec::new(),
        };
        assert_eq!(report.complete(false).summary(), "Deleted 1 items");
    }
}
