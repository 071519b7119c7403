//! File snapshot and content fingerprint types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// BLAKE3 digest of a file's full content.
///
/// Two files are duplicates iff their fingerprints are byte-equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Create a new fingerprint from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the digest as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First eight hex characters, for display.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Immutable snapshot of one file, taken once per scan.
///
/// Fields are read-only; re-scan to observe fresh state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
    category: Option<CompactString>,
}

impl FileRecord {
    /// Create a record without a category.
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            category: None,
        }
    }

    /// Attach a category.
    pub fn with_category(mut self, category: impl Into<CompactString>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach whatever a classifier returned.
    pub fn categorized(mut self, category: Option<String>) -> Self {
        self.category = category.map(CompactString::from);
        self
    }

    /// Snapshot a file's metadata from disk.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        Ok(Self::new(path, metadata.len(), metadata.modified()?))
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes at scan time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time at scan time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Category assigned at scan time, if any.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Length of the path string in characters.
    pub fn path_len(&self) -> usize {
        self.path.to_string_lossy().chars().count()
    }

    /// File name component, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
