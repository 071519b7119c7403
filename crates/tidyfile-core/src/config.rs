//! Enumeration configuration and the type-to-folder table.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for enumerating a file set.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to enumerate.
    pub root: PathBuf,

    /// Descend into subdirectories.
    #[builder(default = "false")]
    #[serde(default)]
    pub recursive: bool,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Glob patterns matched against every path component below the root.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple, non-recursive config for a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            follow_symlinks: false,
            include_hidden: true,
            ignore_patterns: Vec::new(),
        }
    }

    /// Check if hidden files should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// One row of the type-to-folder table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category (folder) name.
    pub name: String,
    /// Lowercase extensions including the leading dot.
    pub extensions: Vec<String>,
}

impl CategoryRule {
    /// Create a new rule.
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Whether this rule covers an extension (with leading dot, any case).
    pub fn matches(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.extensions.iter().any(|e| *e == extension)
    }
}

/// Ordered type-to-folder mapping. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    rules: Vec<CategoryRule>,
    fallback: String,
}

/// Category assigned when no rule matches.
pub const OTHER_CATEGORY: &str = "Other";

impl Default for CategoryMap {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::new("PDFs", &[".pdf"]),
                CategoryRule::new(
                    "Images",
                    &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp", ".ico"],
                ),
                CategoryRule::new("CSVs", &[".csv"]),
                CategoryRule::new("Reports", &[".csv", ".xlsx", ".xls", ".xlsm"]),
                CategoryRule::new("Documents", &[".doc", ".docx", ".txt", ".rtf", ".odt"]),
                CategoryRule::new("Spreadsheets", &[".xlsx", ".xls", ".xlsm", ".ods"]),
                CategoryRule::new("Presentations", &[".ppt", ".pptx", ".odp"]),
                CategoryRule::new("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
                CategoryRule::new(
                    "Videos",
                    &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm"],
                ),
                CategoryRule::new("Audio", &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a"]),
                CategoryRule::new(
                    "Code",
                    &[".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".php", ".rb"],
                ),
            ],
            fallback: OTHER_CATEGORY.to_string(),
        }
    }
}

impl CategoryMap {
    /// Create a map from explicit rules.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self {
            rules,
            fallback: OTHER_CATEGORY.to_string(),
        }
    }

    /// Return a map where `custom` rules are consulted before these ones.
    pub fn with_overrides(&self, custom: &[CategoryRule]) -> Self {
        let mut rules = custom.to_vec();
        rules.extend(self.rules.iter().cloned());
        Self {
            rules,
            fallback: self.fallback.clone(),
        }
    }

    /// Category for an extension (with leading dot), or the fallback.
    pub fn lookup(&self, extension: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(extension))
            .map(|rule| rule.name.as_str())
            .unwrap_or(&self.fallback)
    }

    /// All rules, in lookup order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Every category name this map can produce, including the fallback.
    pub fn category_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !names.contains(&rule.name.as_str()) {
                names.push(&rule.name);
            }
        }
        if !names.contains(&self.fallback.as_str()) {
            names.push(&self.fallback);
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .recursive(true)
            .follow_symlinks(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert!(config.recursive);
        assert!(config.follow_symlinks);
        assert!(config.include_hidden);
    }

    #[test]
    fn test_config_builder_requires_root() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_should_skip_hidden() {
        let mut config = ScanConfig::new("/test");
        assert!(!config.should_skip_hidden(".git"));

        config.include_hidden = false;
        assert!(config.should_skip_hidden(".git"));
        assert!(!config.should_skip_hidden("src"));
    }

    #[test]
    fn test_category_lookup_first_match_wins() {
        let map = CategoryMap::default();
        assert_eq!(map.lookup(".pdf"), "PDFs");
        assert_eq!(map.lookup(".JPG"), "Images");
        // .csv is listed under both CSVs and Reports
        assert_eq!(map.lookup(".csv"), "CSVs");
        // .xlsx is listed under both Reports and Spreadsheets
        assert_eq!(map.lookup(".xlsx"), "Reports");
        assert_eq!(map.lookup(".unknown"), OTHER_CATEGORY);
        assert_eq!(map.lookup(""), OTHER_CATEGORY);
    }

    #[test]
    fn test_category_overrides_take_precedence() {
        let map = CategoryMap::default().with_overrides(&[CategoryRule::new("Ledgers", &[".csv"])]);
        assert_eq!(map.lookup(".csv"), "Ledgers");
        assert_eq!(map.lookup(".pdf"), "PDFs");
    }

    #[test]
    fn test_category_names_are_unique() {
        let binding = CategoryMap::default();
        let names = binding.category_names();
        assert_eq!(names.first(), Some(&"PDFs"));
        assert_eq!(names.last(), Some(&OTHER_CATEGORY));
        assert_eq!(names.len(), 12);
    }
}
