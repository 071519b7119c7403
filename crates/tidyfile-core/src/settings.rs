//! User settings file.
//!
//! Every field has a default, so a partial (or missing) file is fine.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::classify::default_invoice_keywords;
use crate::config::{CategoryMap, CategoryRule};
use crate::error::TidyError;
use crate::strategy::KeepStrategy;

/// Default chunk size for streaming file content (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Settings loaded from `settings.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// strftime pattern used by the date-prefix rename.
    pub date_format: String,
    /// strftime pattern embedded in archive bundle names.
    pub bundle_date_format: String,
    /// Archive directory, relative to the scanned root unless absolute.
    pub archive_dir: PathBuf,
    /// Minimum age in days for archiving.
    pub min_age_days: i64,
    /// Default keep strategy name.
    pub keep_strategy: String,
    /// Read buffer size for fingerprinting.
    pub hash_chunk_size: usize,
    /// Send deleted files to the OS trash instead of unlinking.
    pub use_trash: bool,
    /// File name fragments that mark a download as an invoice.
    pub invoice_keywords: Vec<String>,
    /// Extra type-to-folder rules, consulted before the built-in table.
    pub categories: Vec<CategoryRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_format: "%Y%m%d".to_string(),
            bundle_date_format: "%Y%m".to_string(),
            archive_dir: PathBuf::from("Archives"),
            min_age_days: 30,
            keep_strategy: KeepStrategy::default().to_string(),
            hash_chunk_size: DEFAULT_CHUNK_SIZE,
            use_trash: false,
            invoice_keywords: default_invoice_keywords(),
            categories: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tidyfile").join("settings.toml"))
    }

    /// Load settings from the default location, or return defaults if there
    /// is no file. A file that exists but does not parse is an error.
    pub fn load() -> Result<Self, TidyError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, TidyError> {
        let content = std::fs::read_to_string(path).map_err(|e| TidyError::io(path, e))?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| TidyError::config(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Save settings to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), TidyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TidyError::io(parent, e))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| TidyError::config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| TidyError::io(path, e))
    }

    /// Reject values no component could work with.
    pub fn validate(&self) -> Result<(), TidyError> {
        if self.min_age_days < 0 {
            return Err(TidyError::config(format!(
                "min_age_days must not be negative (got {})",
                self.min_age_days
            )));
        }
        if self.hash_chunk_size == 0 {
            return Err(TidyError::config("hash_chunk_size must be greater than zero"));
        }
        validate_date_format(&self.date_format)?;
        validate_date_format(&self.bundle_date_format)?;
        self.strategy()?;
        Ok(())
    }

    /// The configured keep strategy.
    pub fn strategy(&self) -> Result<KeepStrategy, TidyError> {
        KeepStrategy::parse(&self.keep_strategy)
    }

    /// Built-in type table with the custom rules in front.
    pub fn category_map(&self) -> CategoryMap {
        CategoryMap::default().with_overrides(&self.categories)
    }
}

/// Reject empty or malformed strftime patterns.
pub fn validate_date_format(format: &str) -> Result<(), TidyError> {
    if format.trim().is_empty() {
        return Err(TidyError::config("date format must not be empty"));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(TidyError::config(format!("invalid date format '{format}'")));
    }
    Ok(())
}
