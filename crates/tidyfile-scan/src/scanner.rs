//! JWalk-based file enumerator.

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};

use tidyfile_core::{
    Classifier, FailureKind, FileFailure, FileRecord, ScanConfig, TidyError, Unclassified,
};

/// Ordered file records for one root, plus per-file problems.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Regular files in walk order (sorted by name within each directory).
    pub records: Vec<FileRecord>,
    /// Entries that could not be read.
    pub warnings: Vec<FileFailure>,
}

impl ScanOutput {
    /// Total bytes across all records.
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(FileRecord::size).sum()
    }
}

/// Walks a root directory and snapshots every regular file in it.
pub struct Enumerator<'a> {
    classifier: &'a dyn Classifier,
}

impl Enumerator<'static> {
    /// Create an enumerator that assigns no categories.
    pub fn new() -> Self {
        Self {
            classifier: &Unclassified,
        }
    }
}

impl Default for Enumerator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Enumerator<'a> {
    /// Create an enumerator that tags each record via `classifier`.
    pub fn with_classifier(classifier: &'a dyn Classifier) -> Self {
        Self { classifier }
    }

    /// Enumerate files under `config.root`.
    ///
    /// Directories and symlinks never become records. Metadata failures are
    /// collected as warnings; only a bad root aborts.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanOutput, TidyError> {
        let start = Instant::now();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| TidyError::io(&config.root, e))?;

        if !root.is_dir() {
            return Err(TidyError::NotADirectory { path: root });
        }

        let ignore = build_ignore_set(&config.ignore_patterns)?;
        let max_depth = if config.recursive { usize::MAX } else { 1 };

        let walker = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .min_depth(1)
            .max_depth(max_depth);

        let mut records = Vec::new();
        let mut warnings = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::warn!(path = %path.display(), "{err}");
                    warnings.push(FileFailure::new(path, err.to_string(), FailureKind::Metadata));
                    continue;
                }
            };

            let path = entry.path();
            if is_ignored(&ignore, &root, &path) {
                continue;
            }

            // With follow_links on, file_type() reports the target, so the
            // link itself is only visible through path_is_symlink().
            let file_type = entry.file_type();
            if !file_type.is_file() || file_type.is_symlink() || entry.path_is_symlink() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    tracing::warn!(path = %path.display(), "{err}");
                    warnings.push(FileFailure::new(&path, err.to_string(), FailureKind::Metadata));
                    continue;
                }
            };

            let modified = match metadata.modified() {
                Ok(m) => m,
                Err(err) => {
                    warnings.push(FileFailure::from_io(&path, &err, FailureKind::Metadata));
                    continue;
                }
            };

            let category = self.classifier.category(&path);
            records.push(FileRecord::new(path, metadata.len(), modified).categorized(category));
        }

        tracing::debug!(
            root = %root.display(),
            files = records.len(),
            warnings = warnings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "enumerated"
        );

        Ok(ScanOutput {
            root,
            records,
            warnings,
        })
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<Option<GlobSet>, TidyError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| TidyError::config(format!("invalid ignore pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| TidyError::config(e.to_string()))
}

/// Whether any component of `path` below `root` matches an ignore glob.
fn is_ignored(ignore: &Option<GlobSet>, root: &Path, path: &Path) -> bool {
    let Some(set) = ignore else {
        return false;
    };
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|c| match c {
        Component::Normal(name) => set.is_match(Path::new(name)),
        _ => false,
    })
}
