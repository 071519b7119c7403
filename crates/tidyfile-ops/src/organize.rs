//! Sorting files into per-category folders.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use derive_builder::Builder;

use tidyfile_core::{disambiguate, FailureKind, FileRecord, Reporter, OTHER_CATEGORY};

use crate::move_op::{apply_moves, MovePlan, MoveReport, PlannedMove, SkippedFile};

/// Configuration for organizing.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrganizeConfig {
    /// Folder that receives one subfolder per category.
    pub target_root: PathBuf,

    /// Category folder names. Files already sitting directly in one of
    /// these (under `target_root`) are left alone.
    #[builder(default)]
    pub category_names: Vec<String>,

    /// Folder for records without a category.
    #[builder(default = "OTHER_CATEGORY.to_string()")]
    pub fallback_category: String,
}

impl OrganizeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.target_root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Target root cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Target root is required".to_string()),
        }
    }
}

impl OrganizeConfig {
    /// Create a new config builder.
    pub fn builder() -> OrganizeConfigBuilder {
        OrganizeConfigBuilder::default()
    }
}

/// Moves records into `<target_root>/<category>/`.
pub struct Organizer {
    config: OrganizeConfig,
}

impl Organizer {
    /// Create an organizer.
    pub fn new(config: OrganizeConfig) -> Self {
        Self { config }
    }

    /// Compute every move without touching the filesystem.
    ///
    /// Targets are unique among themselves and against existing files;
    /// clashes get `_1`, `_2`, ... suffixes.
    pub fn plan(&self, records: &[FileRecord]) -> MovePlan {
        let mut plan = MovePlan::default();
        let mut planned: HashSet<PathBuf> = HashSet::new();

        for record in records {
            let category = record
                .category()
                .unwrap_or(self.config.fallback_category.as_str());
            let folder = self.config.target_root.join(category);

            if self.already_sorted(record.path(), &folder) {
                plan.skipped.push(SkippedFile {
                    path: record.path().to_path_buf(),
                    reason: "already in a category folder".to_string(),
                });
                continue;
            }

            let wanted = folder.join(record.file_name());
            match disambiguate(&wanted, |p| p.exists() || planned.contains(p)) {
                Some(to) => {
                    planned.insert(to.clone());
                    plan.moves.push(PlannedMove {
                        from: record.path().to_path_buf(),
                        to,
                    });
                }
                None => plan.skipped.push(SkippedFile {
                    path: record.path().to_path_buf(),
                    reason: "no free target name".to_string(),
                }),
            }
        }

        tracing::debug!(
            moves = plan.moves.len(),
            skipped = plan.skipped.len(),
            "organize plan"
        );
        plan
    }

    /// Plan and apply in one step.
    pub fn organize(
        &self,
        records: &[FileRecord],
        dry_run: bool,
        reporter: &dyn Reporter,
    ) -> MoveReport {
        apply_moves(&self.plan(records), dry_run, FailureKind::Move, reporter)
    }

    fn already_sorted(&self, path: &Path, own_folder: &Path) -> bool {
        let Some(parent) = path.parent() else {
            return false;
        };
        if parent == own_folder {
            return true;
        }
        parent.parent() == Some(self.config.target_root.as_path())
            && parent
                .file_name()
                .map(|name| self.config.category_names.iter().any(|c| name == c.as_str()))
                .unwrap_or(false)
    }
}
