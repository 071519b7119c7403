//! Integration tests for tidyfile-ops.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use zip::ZipArchive;

use tidyfile_analyze::{AgeFilter, AgeFilterConfig, ArchivePlan};
use tidyfile_core::{
    Classifier, EventKind, FailureKind, FileRecord, KeepStrategy, NullReporter, RecordingReporter,
    TidyError, TypeClassifier,
};
use tidyfile_ops::{
    ArchiveConfig, ArchiveWriter, DedupeConfig, Deduplicator, Deleter, EntrySource, FsDeleter,
    FsSource, OrganizeConfig, Organizer,
};

const DAY: u64 = 24 * 60 * 60;

fn write_file(root: &Path, name: &str, content: &str, age_days: u64) -> FileRecord {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    FileRecord::new(
        path,
        content.len() as u64,
        SystemTime::now() - Duration::from_secs(age_days * DAY),
    )
}

/// Reads from disk, except for one path whose read breaks halfway.
struct FailingSource {
    broken: PathBuf,
}

struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("simulated read failure"))
    }
}

impl EntrySource for FailingSource {
    fn open(&self, record: &FileRecord) -> io::Result<Box<dyn Read + '_>> {
        if record.path() == self.broken {
            Ok(Box::new(BrokenReader))
        } else {
            FsSource.open(record)
        }
    }
}

/// Refuses to delete anything.
struct StubbornDeleter;

impl Deleter for StubbornDeleter {
    fn delete(&self, _record: &FileRecord) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

fn archive_plan(root: &Path, entries: Vec<FileRecord>) -> ArchivePlan {
    ArchivePlan {
        category: None,
        entries,
        destination_bundle_path: root.join("Archives/archive_202401.zip"),
    }
}

fn deleting_writer(root: &Path) -> ArchiveWriter {
    ArchiveWriter::with_config(
        ArchiveConfig::builder()
            .source_root(Some(root.to_path_buf()))
            .delete_originals(true)
            .build()
            .unwrap(),
    )
}

#[test]
fn test_dry_run_duplicate_pipeline() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let records = vec![
        write_file(root, "one.txt", "unique one", 1),
        write_file(root, "copy_a.txt", "duplicated", 2),
        write_file(root, "two.txt", "unique two", 3),
        write_file(root, "copy_b.txt", "duplicated", 4),
        write_file(root, "three.txt", "unique three", 5),
    ];

    let config = DedupeConfig::builder()
        .strategy(KeepStrategy::KeepNewest)
        .delete(true)
        .dry_run(true)
        .build()
        .unwrap();
    let reporter = RecordingReporter::new();
    let summary =
        Deduplicator::with_config(config).run(&records, &FsDeleter::permanent(), &reporter);

    assert_eq!(summary.report.groups.len(), 1);
    assert_eq!(summary.report.groups[0].count(), 2);
    assert!(summary.deletion.deleted.is_empty());
    assert_eq!(summary.deletion.would_delete, vec![records[3].path().to_path_buf()]);
    assert_eq!(reporter.count(EventKind::Deleted), 0);
    assert!(records.iter().all(|r| r.path().exists()));
}

#[test]
fn test_archive_entry_failure_is_never_deleted() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let entries: Vec<_> = (0..5)
        .map(|i| write_file(root, &format!("f{i}.log"), &format!("line {i}"), 90))
        .collect();
    let broken = entries[2].path().to_path_buf();

    let writer = deleting_writer(root).with_source(FailingSource {
        broken: broken.clone(),
    });
    let result = writer
        .write(&archive_plan(root, entries.clone()), &FsDeleter::permanent(), &NullReporter)
        .unwrap();

    assert!(result.created);
    assert_eq!(result.entries_written.len(), 4);
    assert_eq!(result.entries_failed.len(), 1);
    assert_eq!(result.entries_failed[0].path, broken);
    assert_eq!(result.entries_failed[0].kind, FailureKind::ArchiveEntry);
    assert_eq!(result.deletion.deleted.len(), 4);
    assert!(!result.deletion.deleted.contains(&broken));
    assert!(broken.exists());

    let archive = ZipArchive::new(File::open(&result.bundle_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 4);
}

#[test]
fn test_bundle_failure_deletes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let entries = vec![
        write_file(root, "a.log", "a", 90),
        write_file(root, "b.log", "b", 90),
    ];
    // a regular file where the archive directory should be
    fs::write(root.join("Archives"), "not a directory").unwrap();

    let err = deleting_writer(root)
        .write(&archive_plan(root, entries.clone()), &FsDeleter::permanent(), &NullReporter)
        .unwrap_err();

    assert!(matches!(err, TidyError::ArchiveWrite { .. }));
    assert!(entries.iter().all(|r| r.path().exists()));
}

#[test]
fn test_failed_plan_leaves_other_plans_alone() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("blocked"), "not a directory").unwrap();

    let good = archive_plan(root, vec![write_file(root, "good.log", "g", 90)]);
    let bad = ArchivePlan {
        category: Some("bad".to_string()),
        entries: vec![write_file(root, "bad.log", "b", 90)],
        destination_bundle_path: root.join("blocked/archive_bad_202401.zip"),
    };

    let report = deleting_writer(root).write_all(
        &[bad.clone(), good.clone()],
        &FsDeleter::permanent(),
        &NullReporter,
    );

    assert_eq!(report.aborted.len(), 1);
    assert_eq!(report.aborted[0].category.as_deref(), Some("bad"));
    assert_eq!(report.results.len(), 1);
    assert!(bad.entries[0].path().exists());
    assert!(!good.entries[0].path().exists());
}

#[test]
fn test_delete_failures_are_reported_not_fatal() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let entries = vec![write_file(root, "a.log", "a", 90)];

    let result = deleting_writer(root)
        .write(&archive_plan(root, entries.clone()), &StubbornDeleter, &NullReporter)
        .unwrap();

    assert!(result.created);
    assert!(result.bundle_path.exists());
    assert_eq!(result.deletion.failed.len(), 1);
    assert_eq!(result.deletion.failed[0].kind, FailureKind::Delete);
    assert!(entries[0].path().exists());
}

#[test]
fn test_age_filter_feeds_archive_writer() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let classifier = TypeClassifier::default();
    let classify = |r: FileRecord| {
        let category = classifier.category(r.path());
        r.categorized(category)
    };
    let records = vec![
        classify(write_file(root, "old.pdf", "pdf", 60)),
        classify(write_file(root, "old.png", "png", 60)),
        classify(write_file(root, "new.pdf", "pdf", 1)),
    ];

    let filter = AgeFilter::with_config(
        AgeFilterConfig::builder()
            .archive_dir(root.join("Archives"))
            .build()
            .unwrap(),
    );
    let plans = filter.filter(&records, 30, true).unwrap();
    assert_eq!(plans.len(), 2);

    let report = ArchiveWriter::new().write_all(&plans, &FsDeleter::permanent(), &NullReporter);
    assert!(report.aborted.is_empty());
    assert_eq!(report.entries_written(), 2);
    assert!(report.results.iter().all(|r| r.bundle_path.exists()));
    assert!(records.iter().all(|r| r.path().exists()));
}

#[test]
fn test_organize_then_rerun_is_stable() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let records = vec![
        write_file(root, "report.pdf", "r", 1).with_category("PDFs"),
        write_file(root, "photo.png", "p", 1).with_category("Images"),
    ];
    let organizer = Organizer::new(
        OrganizeConfig::builder()
            .target_root(root)
            .category_names(vec!["PDFs".to_string(), "Images".to_string()])
            .build()
            .unwrap(),
    );

    let first = organizer.organize(&records, false, &NullReporter);
    assert_eq!(first.moved.len(), 2);

    let moved: Vec<_> = first
        .moved
        .iter()
        .zip(&records)
        .map(|(m, r)| {
            FileRecord::new(&m.to, r.size(), r.modified())
                .categorized(r.category().map(String::from))
        })
        .collect();
    let second = organizer.plan(&moved);
    assert!(second.moves.is_empty());
    assert_eq!(second.skipped.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_symlink_never_costs_the_only_copy() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let target = write_file(root, "file1.txt", "only copy", 1);
    let link = root.join("l.txt");
    std::os::unix::fs::symlink(target.path(), &link).unwrap();
    let records = vec![target.clone(), FileRecord::from_path(&link).unwrap()];

    let config = DedupeConfig::builder()
        .strategy(KeepStrategy::KeepShortestPath)
        .delete(true)
        .build()
        .unwrap();
    let summary =
        Deduplicator::with_config(config).run(&records, &FsDeleter::permanent(), &NullReporter);

    assert!(summary.report.groups.is_empty());
    assert!(summary.deletion.deleted.is_empty());
    assert_eq!(fs::read_to_string(target.path()).unwrap(), "only copy");
}
