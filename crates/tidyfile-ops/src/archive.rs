//! Two-phase archive writer.
//!
//! Phase one streams every entry of an [`ArchivePlan`] into a zip bundle at a
//! staging path (`<bundle>.partial`), finalizes it, then reopens it and
//! reads every entry back. Only a bundle that passes this check is renamed
//! into place. Phase two, if requested, deletes the originals of the entries
//! that made it into the bundle and nothing else.
//!
//! A per-entry read failure is recorded and the bundle continues. A failure
//! to create, finalize, verify or publish the bundle aborts the plan with
//! zero deletions.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use tidyfile_analyze::ArchivePlan;
use tidyfile_core::{
    disambiguate, disambiguate_name, Event, FailureKind, FileFailure, FileRecord, Reporter,
    TidyError,
};

use crate::delete::{delete_records, Deleter, DeletionReport};
use crate::progress::{OperationComplete, OperationType};

/// Suffix of the staging file a bundle is built in.
const STAGING_SUFFIX: &str = ".partial";

/// Supplies entry content.
pub trait EntrySource: Send + Sync {
    /// Open a record for reading.
    fn open(&self, record: &FileRecord) -> io::Result<Box<dyn Read + '_>>;
}

/// Reads entries straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl EntrySource for FsSource {
    fn open(&self, record: &FileRecord) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(record.path())?))
    }
}

/// Configuration for the archive writer.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ArchiveConfig {
    /// Entry names are paths relative to this root; entries outside it are
    /// stored under their file name.
    #[builder(default)]
    pub source_root: Option<PathBuf>,

    /// Delete originals after the bundle is verified.
    #[builder(default = "false")]
    pub delete_originals: bool,

    /// Read every entry but write and delete nothing.
    #[builder(default = "false")]
    pub dry_run: bool,

    /// Compression for every entry.
    #[builder(default = "CompressionMethod::Deflated")]
    pub compression: CompressionMethod,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            delete_originals: false,
            dry_run: false,
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ArchiveConfig {
    /// Create a new config builder.
    pub fn builder() -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::default()
    }
}

/// Outcome of one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveResult {
    /// Category of the plan.
    pub category: Option<String>,
    /// Final bundle path (the planned path in a dry run).
    pub bundle_path: PathBuf,
    /// Whether a bundle now exists at `bundle_path`.
    pub created: bool,
    /// Entries stored in the bundle (or readable, in a dry run).
    pub entries_written: Vec<PathBuf>,
    /// Entries that could not be stored.
    pub entries_failed: Vec<FileFailure>,
    /// What happened to the originals.
    pub deletion: DeletionReport,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl ArchiveResult {
    /// Completion summary for display.
    pub fn complete(&self) -> OperationComplete {
        OperationComplete {
            operation_type: OperationType::Archive,
            dry_run: self.dry_run,
            succeeded: self.entries_written.len(),
            failed: self.entries_failed.len(),
            skipped: 0,
        }
    }
}

/// A plan that was aborted as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortedPlan {
    pub category: Option<String>,
    pub bundle_path: PathBuf,
    pub message: String,
}

/// Outcome of a multi-plan run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRunReport {
    pub results: Vec<ArchiveResult>,
    pub aborted: Vec<AbortedPlan>,
}

impl ArchiveRunReport {
    /// Entries stored across every plan.
    pub fn entries_written(&self) -> usize {
        self.results.iter().map(|r| r.entries_written.len()).sum()
    }

    /// Entries that failed across every plan.
    pub fn entries_failed(&self) -> usize {
        self.results.iter().map(|r| r.entries_failed.len()).sum()
    }
}

/// Writes archive plans to zip bundles.
pub struct ArchiveWriter {
    config: ArchiveConfig,
    source: Box<dyn EntrySource>,
}

impl ArchiveWriter {
    /// Create a writer with default config reading from disk.
    pub fn new() -> Self {
        Self::with_config(ArchiveConfig::default())
    }

    /// Create a writer with custom config reading from disk.
    pub fn with_config(config: ArchiveConfig) -> Self {
        Self {
            config,
            source: Box::new(FsSource),
        }
    }

    /// Replace where entry content comes from.
    pub fn with_source(mut self, source: impl EntrySource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Write every plan. A failed plan is recorded and the others proceed.
    pub fn write_all(
        &self,
        plans: &[ArchivePlan],
        deleter: &dyn Deleter,
        reporter: &dyn Reporter,
    ) -> ArchiveRunReport {
        let mut report = ArchiveRunReport::default();
        for plan in plans {
            match self.write(plan, deleter, reporter) {
                Ok(result) => report.results.push(result),
                Err(err) => {
                    tracing::error!(bundle = %plan.destination_bundle_path.display(), "{err}");
                    report.aborted.push(AbortedPlan {
                        category: plan.category.clone(),
                        bundle_path: plan.destination_bundle_path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Write one plan.
    ///
    /// Returns `Err` only for bundle-level failures, in which case no
    /// original was deleted and no bundle is left behind.
    pub fn write(
        &self,
        plan: &ArchivePlan,
        deleter: &dyn Deleter,
        reporter: &dyn Reporter,
    ) -> Result<ArchiveResult, TidyError> {
        if self.config.dry_run {
            return Ok(self.simulate(plan, deleter, reporter));
        }

        let wanted = &plan.destination_bundle_path;
        if let Some(parent) = wanted.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TidyError::archive(wanted, e))?;
        }

        let staging = staging_path(wanted);
        let built = self
            .build_bundle(plan, &staging, reporter)
            .and_then(|(written, failed)| {
                if written.is_empty() {
                    return Ok((None, written, failed));
                }
                verify_bundle(&staging, written.len())?;
                let published = publish(&staging, wanted)?;
                Ok((Some(published), written, failed))
            });

        let (published, written, failed) = match built {
            Ok(parts) => parts,
            Err(err) => {
                discard_staging(&staging);
                return Err(err);
            }
        };

        let Some(bundle_path) = published else {
            discard_staging(&staging);
            tracing::warn!(bundle = %wanted.display(), "no entry could be archived; bundle not created");
            return Ok(ArchiveResult {
                category: plan.category.clone(),
                bundle_path: wanted.clone(),
                created: false,
                entries_written: Vec::new(),
                entries_failed: failed,
                deletion: DeletionReport::default(),
                dry_run: false,
            });
        };

        reporter.report(&Event::BundleCreated {
            bundle: &bundle_path,
            entries: written.len(),
        });

        let deletion = if self.config.delete_originals {
            delete_records(&written, deleter, false, reporter)
        } else {
            DeletionReport::default()
        };

        Ok(ArchiveResult {
            category: plan.category.clone(),
            bundle_path,
            created: true,
            entries_written: written.iter().map(|r| r.path().to_path_buf()).collect(),
            entries_failed: failed,
            deletion,
            dry_run: false,
        })
    }

    /// Stream every entry into a new zip at `staging`.
    fn build_bundle(
        &self,
        plan: &ArchivePlan,
        staging: &Path,
        reporter: &dyn Reporter,
    ) -> Result<(Vec<FileRecord>, Vec<FileFailure>), TidyError> {
        let bundle = &plan.destination_bundle_path;
        let file = File::create(staging).map_err(|e| TidyError::archive(bundle, e))?;
        let mut zip = ZipWriter::new(file);

        let mut names: HashSet<String> = HashSet::new();
        let mut written = Vec::new();
        let mut failed = Vec::new();

        for record in &plan.entries {
            let mut reader = match self.source.open(record) {
                Ok(r) => r,
                Err(err) => {
                    failed.push(entry_failed(record, &err, reporter));
                    continue;
                }
            };

            let name = self.entry_name(record, &names);
            zip.start_file(name.as_str(), self.entry_options(record))
                .map_err(|e| TidyError::archive(bundle, e))?;

            match io::copy(&mut reader, &mut zip) {
                Ok(_) => {
                    reporter.report(&Event::Archived {
                        bundle,
                        path: record.path(),
                    });
                    names.insert(name);
                    written.push(record.clone());
                }
                Err(err) => {
                    zip.abort_file().map_err(|e| TidyError::archive(bundle, e))?;
                    failed.push(entry_failed(record, &err, reporter));
                }
            }
        }

        let file = zip.finish().map_err(|e| TidyError::archive(bundle, e))?;
        file.sync_all().map_err(|e| TidyError::archive(bundle, e))?;

        Ok((written, failed))
    }

    /// Dry run: read every entry to find out what would fail, touch nothing.
    fn simulate(
        &self,
        plan: &ArchivePlan,
        deleter: &dyn Deleter,
        reporter: &dyn Reporter,
    ) -> ArchiveResult {
        let mut readable = Vec::new();
        let mut failed = Vec::new();

        for record in &plan.entries {
            let outcome = self
                .source
                .open(record)
                .and_then(|mut reader| io::copy(&mut reader, &mut io::sink()));
            match outcome {
                Ok(_) => readable.push(record.clone()),
                Err(err) => failed.push(entry_failed(record, &err, reporter)),
            }
        }

        reporter.report(&Event::WouldCreateBundle {
            bundle: &plan.destination_bundle_path,
            entries: readable.len(),
        });

        let deletion = if self.config.delete_originals {
            delete_records(&readable, deleter, true, reporter)
        } else {
            DeletionReport::default()
        };

        ArchiveResult {
            category: plan.category.clone(),
            bundle_path: plan.destination_bundle_path.clone(),
            created: false,
            entries_written: readable.iter().map(|r| r.path().to_path_buf()).collect(),
            entries_failed: failed,
            deletion,
            dry_run: true,
        }
    }

    /// Relative `/`-separated entry name, unique within the bundle.
    fn entry_name(&self, record: &FileRecord, taken: &HashSet<String>) -> String {
        let relative = self
            .config
            .source_root
            .as_deref()
            .and_then(|root| record.path().strip_prefix(root).ok())
            .filter(|rel| !rel.as_os_str().is_empty());

        let base = match relative {
            Some(rel) => rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
            None => record.file_name(),
        };

        disambiguate_name(&base, |n| taken.contains(n)).unwrap_or(base)
    }

    fn entry_options(&self, record: &FileRecord) -> SimpleFileOptions {
        let options = SimpleFileOptions::default()
            .compression_method(self.config.compression)
            .large_file(record.size() >= u64::from(u32::MAX));
        match zip_time(record) {
            Some(time) => options.last_modified_time(time),
            None => options,
        }
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_failed(record: &FileRecord, err: &io::Error, reporter: &dyn Reporter) -> FileFailure {
    let failure = FileFailure::from_io(record.path(), err, FailureKind::ArchiveEntry);
    reporter.report(&Event::Failed { failure: &failure });
    failure
}

fn staging_path(bundle: &Path) -> PathBuf {
    let mut name = bundle.as_os_str().to_owned();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Remove a staging file that will not be published.
fn discard_staging(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %staging.display(), "could not remove staging file: {err}");
        }
    }
}

/// Reopen a finished bundle and read every entry to the end, which checks
/// each entry's CRC.
fn verify_bundle(staging: &Path, expected_entries: usize) -> Result<(), TidyError> {
    let file = File::open(staging).map_err(|e| TidyError::archive(staging, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| TidyError::archive(staging, e))?;

    if archive.len() != expected_entries {
        return Err(TidyError::archive(
            staging,
            format!(
                "bundle holds {} entries, expected {expected_entries}",
                archive.len()
            ),
        ));
    }

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| TidyError::archive(staging, e))?;
        io::copy(&mut entry, &mut io::sink()).map_err(|e| TidyError::archive(staging, e))?;
    }
    Ok(())
}

/// Move the verified staging file to its final name without overwriting.
fn publish(staging: &Path, wanted: &Path) -> Result<PathBuf, TidyError> {
    let target = disambiguate(wanted, Path::exists)
        .ok_or_else(|| TidyError::archive(wanted, "no free bundle name"))?;
    fs::rename(staging, &target).map_err(|e| TidyError::archive(&target, e))?;
    Ok(target)
}

/// Zip timestamps cover 1980..=2107; anything else is left unset.
fn zip_time(record: &FileRecord) -> Option<zip::DateTime> {
    let local: DateTime<Local> = record.modified().into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
