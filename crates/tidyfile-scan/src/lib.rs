//! File enumeration for tidyfile.
//!
//! `tidyfile-scan` turns a root directory into an ordered sequence of
//! [`FileRecord`] snapshots. Everything downstream (duplicate detection,
//! archiving, organizing) works on that sequence and never walks the
//! filesystem itself.
//!
//! - **Deterministic order**: entries are sorted by name within each directory
//! - **Flat or recursive**: direct children only unless `recursive` is set
//! - **Ignore globs** matched against every path component below the root
//! - **Classification**: an injected [`Classifier`] tags each record
//!
//! # Example
//!
//! ```rust,no_run
//! use tidyfile_scan::{Enumerator, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let output = Enumerator::new().scan(&config).unwrap();
//!
//! println!("{} files, {} bytes", output.records.len(), output.total_size());
//! ```

mod scanner;

pub use scanner::{Enumerator, ScanOutput};

// Re-export core types for convenience
pub use tidyfile_core::{Classifier, FileFailure, FileRecord, ScanConfig, ScanConfigBuilder, TidyError};
