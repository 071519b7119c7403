//! Age-based archive planning.
//!
//! Selects files whose modification time is at least `min_age_days` before
//! the reference time and batches them into [`ArchivePlan`]s, optionally one
//! per category.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use tidyfile_core::{
    disambiguate, sanitize_component, validate_date_format, FileRecord, TidyError,
};

/// Seconds in one day.
const DAY_SECS: u64 = 24 * 60 * 60;

/// Plan name for records without a category in a by-category run.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Configuration for age-based planning.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct AgeFilterConfig {
    /// Reference time for age calculations (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,

    /// Directory that bundles are written into.
    #[builder(default = "PathBuf::from(\"Archives\")")]
    pub archive_dir: PathBuf,

    /// strftime pattern for the run date embedded in bundle names.
    #[builder(default = "\"%Y%m\".to_string()")]
    pub bundle_date_format: String,
}

impl AgeFilterConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.bundle_date_format {
            Some(ref format) => validate_date_format(format).map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

impl Default for AgeFilterConfig {
    fn default() -> Self {
        Self {
            reference_time: SystemTime::now(),
            archive_dir: PathBuf::from("Archives"),
            bundle_date_format: "%Y%m".to_string(),
        }
    }
}

impl AgeFilterConfig {
    /// Create a new config builder.
    pub fn builder() -> AgeFilterConfigBuilder {
        AgeFilterConfigBuilder::default()
    }
}

/// A batch of files destined for one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePlan {
    /// Category of every entry, or `None` for an uncategorized run.
    pub category: Option<String>,
    /// Entries in discovery order.
    pub entries: Vec<FileRecord>,
    /// Where the bundle will be written.
    pub destination_bundle_path: PathBuf,
}

impl ArchivePlan {
    /// Total bytes across all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(FileRecord::size).sum()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Age of a file relative to a reference time; future times count as zero.
pub fn file_age(modified: SystemTime, reference_time: SystemTime) -> Duration {
    reference_time
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

/// Age/category filter producing archive plans.
pub struct AgeFilter {
    config: AgeFilterConfig,
}

impl AgeFilter {
    /// Create a new filter with default config.
    pub fn new() -> Self {
        Self {
            config: AgeFilterConfig::default(),
        }
    }

    /// Create a new filter with custom config.
    pub fn with_config(config: AgeFilterConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &AgeFilterConfig {
        &self.config
    }

    /// Whether a record is at least `min_age` old (inclusive).
    pub fn is_eligible(&self, record: &FileRecord, min_age: Duration) -> bool {
        file_age(record.modified(), self.config.reference_time) >= min_age
    }

    /// Build archive plans for every record at least `min_age_days` old.
    ///
    /// Without `by_category` the result is a single plan with no category.
    /// With it, there is one plan per non-empty category in lexicographic
    /// order; records without a category go to [`UNCATEGORIZED`]. Nothing
    /// eligible means no plans at all.
    pub fn filter(
        &self,
        records: &[FileRecord],
        min_age_days: i64,
        by_category: bool,
    ) -> Result<Vec<ArchivePlan>, TidyError> {
        let days = u64::try_from(min_age_days).map_err(|_| {
            TidyError::config(format!("minimum age must not be negative (got {min_age_days})"))
        })?;
        let min_age = Duration::from_secs(days.saturating_mul(DAY_SECS));

        let eligible: Vec<&FileRecord> = records
            .iter()
            .filter(|r| self.is_eligible(r, min_age))
            .collect();

        tracing::debug!(
            total = records.len(),
            eligible = eligible.len(),
            min_age_days,
            "age filter"
        );

        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<(Option<String>, Vec<FileRecord>)> = if by_category {
            let mut by_name: BTreeMap<String, Vec<FileRecord>> = BTreeMap::new();
            for record in eligible {
                let name = record.category().unwrap_or(UNCATEGORIZED).to_string();
                by_name.entry(name).or_default().push(record.clone());
            }
            by_name
                .into_iter()
                .map(|(name, entries)| (Some(name), entries))
                .collect()
        } else {
            vec![(None, eligible.into_iter().cloned().collect())]
        };

        let run_date = self.run_date()?;
        let mut planned: HashSet<PathBuf> = HashSet::new();
        let mut plans = Vec::with_capacity(batches.len());

        for (category, entries) in batches {
            let wanted = self.bundle_path(category.as_deref(), &run_date);
            let destination = disambiguate(&wanted, |p| p.exists() || planned.contains(p))
                .ok_or_else(|| TidyError::archive(&wanted, "no free bundle name"))?;
            planned.insert(destination.clone());
            plans.push(ArchivePlan {
                category,
                entries,
                destination_bundle_path: destination,
            });
        }

        Ok(plans)
    }

    fn run_date(&self) -> Result<String, TidyError> {
        let local: DateTime<Local> = self.config.reference_time.into();
        let mut out = String::new();
        write!(out, "{}", local.format(&self.config.bundle_date_format)).map_err(|_| {
            TidyError::config(format!(
                "invalid date format '{}'",
                self.config.bundle_date_format
            ))
        })?;
        Ok(out)
    }

    fn bundle_path(&self, category: Option<&str>, run_date: &str) -> PathBuf {
        let name = match category {
            Some(c) => format!("archive_{}_{}.zip", sanitize_component(c), run_date),
            None => format!("archive_{run_date}.zip"),
        };
        self.config.archive_dir.join(name)
    }
}

impl Default for AgeFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration as a human-readable age string.
pub fn format_age(duration: Duration) -> String {
    let days = duration.as_secs() / DAY_SECS;

    if days == 0 {
        "today".to_string()
    } else if days == 1 {
        "1 day".to_string()
    } else if days < 30 {
        format!("{days} days")
    } else if days < 365 {
        let months = days / 30;
        if months == 1 {
            "1 month".to_string()
        } else {
            format!("{months} months")
        }
    } else {
        let years = days / 365;
        if years == 1 {
            "1 year".to_string()
        } else {
            format!("{years} years")
        }
    }
}
