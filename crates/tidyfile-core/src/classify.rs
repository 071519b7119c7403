//! Pluggable category classifiers.
//!
//! A classifier maps a path to an optional category name. Enumeration asks
//! one classifier per run and stores the answer on each [`FileRecord`];
//! archiving and organizing only ever read that stored value.
//!
//! [`FileRecord`]: crate::FileRecord

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::CategoryMap;

/// Category used by [`ExtensionClassifier`] for files with no extension.
pub const NO_EXTENSION: &str = "no_extension";

/// Assigns a category to a path.
pub trait Classifier: Send + Sync {
    /// Category for `path`, or `None` if the classifier has no opinion.
    fn category(&self, path: &Path) -> Option<String>;
}

/// Never assigns a category.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unclassified;

impl Classifier for Unclassified {
    fn category(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Groups by the lowercase extension itself (`pdf`, `jpg`, `no_extension`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

impl Classifier for ExtensionClassifier {
    fn category(&self, path: &Path) -> Option<String> {
        let category = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        Some(category)
    }
}

/// Groups by file type using a [`CategoryMap`].
#[derive(Debug, Clone, Default)]
pub struct TypeClassifier {
    map: CategoryMap,
}

impl TypeClassifier {
    /// Create a classifier over a specific table.
    pub fn new(map: CategoryMap) -> Self {
        Self { map }
    }

    /// The table this classifier consults.
    pub fn map(&self) -> &CategoryMap {
        &self.map
    }
}

impl Classifier for TypeClassifier {
    fn category(&self, path: &Path) -> Option<String> {
        Some(self.map.lookup(&dotted_extension(path)).to_string())
    }
}

/// Download-folder rules: invoices go to `Finance`, images to `Media`,
/// everything else falls through to a [`TypeClassifier`].
#[derive(Debug, Clone)]
pub struct DownloadsClassifier {
    keywords: Vec<String>,
    types: TypeClassifier,
}

/// Category for files whose name contains an invoice keyword.
pub const FINANCE_CATEGORY: &str = "Finance";
/// Category for images in a download folder.
pub const MEDIA_CATEGORY: &str = "Media";

/// File name fragments that mark a download as an invoice.
pub fn default_invoice_keywords() -> Vec<String> {
    ["invoice", "bill", "receipt", "payment", "statement", "invoice_", "inv_"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

impl DownloadsClassifier {
    /// Create a classifier with custom keywords and type table.
    pub fn new(keywords: Vec<String>, types: TypeClassifier) -> Self {
        let keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        Self { keywords, types }
    }

    fn is_invoice(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

impl Default for DownloadsClassifier {
    fn default() -> Self {
        Self::new(default_invoice_keywords(), TypeClassifier::default())
    }
}

impl Classifier for DownloadsClassifier {
    fn category(&self, path: &Path) -> Option<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.is_invoice(&name) {
            return Some(FINANCE_CATEGORY.to_string());
        }
        if self.types.map().lookup(&dotted_extension(path)) == "Images" {
            return Some(MEDIA_CATEGORY.to_string());
        }
        self.types.category(path)
    }
}

/// Selectable classifier kinds, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// File-type table.
    #[default]
    Type,
    /// Raw extension.
    Extension,
    /// Download-folder rules.
    Downloads,
    /// No categories.
    None,
}

impl ClassifierKind {
    /// Build the classifier this kind names.
    pub fn build(self, map: CategoryMap, invoice_keywords: Vec<String>) -> Box<dyn Classifier> {
        match self {
            Self::Type => Box::new(TypeClassifier::new(map)),
            Self::Extension => Box::new(ExtensionClassifier),
            Self::Downloads => {
                Box::new(DownloadsClassifier::new(invoice_keywords, TypeClassifier::new(map)))
            }
            Self::None => Box::new(Unclassified),
        }
    }
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
