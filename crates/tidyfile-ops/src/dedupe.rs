//! Duplicate pipeline: group, resolve, optionally delete.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use tidyfile_analyze::{resolve_all, DuplicateConfig, DuplicateFinder, DuplicateReport, KeepDecision};
use tidyfile_core::{Event, FileRecord, KeepStrategy, Reporter};

use crate::delete::{delete_records, Deleter, DeletionReport};

/// Configuration for a duplicate run.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DedupeConfig {
    /// Which member of each group survives.
    #[builder(default)]
    pub strategy: KeepStrategy,

    /// Delete the non-kept members.
    #[builder(default = "false")]
    pub delete: bool,

    /// Report deletions without performing them.
    #[builder(default = "false")]
    pub dry_run: bool,

    /// Fingerprinting and grouping options.
    #[builder(default)]
    pub duplicates: DuplicateConfig,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            strategy: KeepStrategy::default(),
            delete: false,
            dry_run: false,
            duplicates: DuplicateConfig::default(),
        }
    }
}

impl DedupeConfig {
    /// Create a new config builder.
    pub fn builder() -> DedupeConfigBuilder {
        DedupeConfigBuilder::default()
    }
}

/// Everything a duplicate run found and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeSummary {
    /// Groups, statistics and fingerprint failures.
    pub report: DuplicateReport,
    /// One decision per group, in group order.
    pub decisions: Vec<KeepDecision>,
    /// Outcome of the deletion phase (empty unless deletion was requested).
    pub deletion: DeletionReport,
    /// Whether deletions were suppressed.
    pub dry_run: bool,
}

impl DedupeSummary {
    /// Paths retained, one per group.
    pub fn kept(&self) -> impl Iterator<Item = &Path> {
        self.decisions.iter().map(|d| d.keep.path())
    }

    /// Bytes freed (or that would be freed) by removing every non-kept file.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.decisions.iter().map(KeepDecision::reclaimable_bytes).sum()
    }
}

/// Runs the duplicate pipeline.
pub struct Deduplicator {
    config: DedupeConfig,
}

impl Deduplicator {
    /// Create a deduplicator with default config (report only).
    pub fn new() -> Self {
        Self::with_config(DedupeConfig::default())
    }

    /// Create a deduplicator with custom config.
    pub fn with_config(config: DedupeConfig) -> Self {
        Self { config }
    }

    /// Group `records`, pick a keeper per group and, if configured, delete
    /// the rest through `deleter`.
    pub fn run(
        &self,
        records: &[FileRecord],
        deleter: &dyn Deleter,
        reporter: &dyn Reporter,
    ) -> DedupeSummary {
        let finder = DuplicateFinder::with_config(self.config.duplicates.clone());
        let report = finder.group(records, reporter);
        let decisions = resolve_all(&report.groups, self.config.strategy);

        for decision in &decisions {
            reporter.report(&Event::Kept {
                path: decision.keep.path(),
            });
        }

        let deletion = if self.config.delete {
            delete_records(
                decisions.iter().flat_map(|d| &d.remove),
                deleter,
                self.config.dry_run,
                reporter,
            )
        } else {
            DeletionReport::default()
        };

        tracing::info!(
            groups = report.group_count,
            wasted = report.total_wasted_space,
            deleted = deletion.deleted.len(),
            dry_run = self.config.dry_run,
            "duplicate run finished"
        );

        DedupeSummary {
            report,
            decisions,
            deletion,
            dry_run: self.config.dry_run,
        }
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}
