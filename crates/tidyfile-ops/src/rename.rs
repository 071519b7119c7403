//! Date-prefix rename.
//!
//! `report.pdf` modified on 2024-01-15 becomes `20240115_report.pdf` with the
//! default `%Y%m%d` format. Names that already carry a date prefix are left
//! alone, so running twice is harmless.

use std::collections::HashSet;
use std::fmt::Write;
use std::path::PathBuf;

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, Local};

use tidyfile_core::{
    disambiguate, validate_date_format, FailureKind, FileRecord, Reporter, TidyError,
};

use crate::move_op::{apply_moves, MovePlan, MoveReport, PlannedMove, SkippedFile};

/// Prefixes file names with their modification date.
#[derive(Debug, Clone)]
pub struct DatePrefixRenamer {
    date_format: String,
}

impl DatePrefixRenamer {
    /// Create a renamer for a strftime pattern.
    pub fn new(date_format: impl Into<String>) -> Result<Self, TidyError> {
        let date_format = date_format.into();
        validate_date_format(&date_format)?;
        Ok(Self { date_format })
    }

    /// Whether `name` already starts with `<date>_` in this format.
    pub fn has_date_prefix(&self, name: &str) -> bool {
        name.match_indices('_').any(|(idx, _)| {
            let mut parsed = Parsed::new();
            idx > 0 && parse(&mut parsed, &name[..idx], StrftimeItems::new(&self.date_format)).is_ok()
        })
    }

    /// The prefixed name for a record.
    pub fn prefixed_name(&self, record: &FileRecord) -> Result<String, TidyError> {
        let modified: DateTime<Local> = record.modified().into();
        let mut name = String::new();
        write!(name, "{}_{}", modified.format(&self.date_format), record.file_name())
            .map_err(|_| TidyError::config(format!("invalid date format '{}'", self.date_format)))?;
        Ok(name)
    }

    /// Compute every rename without touching the filesystem.
    pub fn plan(&self, records: &[FileRecord]) -> MovePlan {
        let mut plan = MovePlan::default();
        let mut planned: HashSet<PathBuf> = HashSet::new();

        for record in records {
            let skip = |reason: String| SkippedFile {
                path: record.path().to_path_buf(),
                reason,
            };

            if self.has_date_prefix(&record.file_name()) {
                plan.skipped.push(skip("already date-prefixed".to_string()));
                continue;
            }

            let new_name = match self.prefixed_name(record) {
                Ok(n) => n,
                Err(e) => {
                    plan.skipped.push(skip(e.to_string()));
                    continue;
                }
            };
            if let Err(reason) = validate_filename(&new_name) {
                plan.skipped.push(skip(reason));
                continue;
            }

            let parent = record.path().parent().unwrap_or(std::path::Path::new(""));
            let wanted = parent.join(&new_name);
            match disambiguate(&wanted, |p| p.exists() || planned.contains(p)) {
                Some(to) => {
                    planned.insert(to.clone());
                    plan.moves.push(PlannedMove {
                        from: record.path().to_path_buf(),
                        to,
                    });
                }
                None => plan.skipped.push(skip("no free target name".to_string())),
            }
        }

        plan
    }

    /// Plan and apply in one step.
    pub fn rename(
        &self,
        records: &[FileRecord],
        dry_run: bool,
        reporter: &dyn Reporter,
    ) -> MoveReport {
        apply_moves(&self.plan(records), dry_run, FailureKind::Rename, reporter)
    }
}

impl Default for DatePrefixRenamer {
    fn default() -> Self {
        Self {
            date_format: "%Y%m%d".to_string(),
        }
    }
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".into());
    }

    for c in ['/', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c));
        }
    }

    #[cfg(target_os = "windows")]
    {
        for c in ['\\', ':', '*', '?', '"', '<', '>', '|'] {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err("Name cannot start or end with spaces".into());
    }

    if name.ends_with('.') {
        return Err("Name cannot end with a dot".into());
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}
