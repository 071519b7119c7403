//! Read-only analysis for tidyfile.
//!
//! This crate decides; it never modifies the filesystem.
//!
//! - **Fingerprinting** - Streamed BLAKE3 digest of a file's full content
//! - **Duplicate detection** - Group files whose fingerprints are equal
//! - **Keep strategies** - Pick the one file to retain from each group
//! - **Age filtering** - Batch old files into archive plans, per category
//!
//! # Duplicate Detection
//!
//! ```rust,no_run
//! use tidyfile_analyze::{resolve, DuplicateFinder, KeepStrategy};
//! use tidyfile_core::NullReporter;
//! use tidyfile_scan::{Enumerator, ScanConfig};
//!
//! let output = Enumerator::new().scan(&ScanConfig::new("/path/to/scan")).unwrap();
//! let report = DuplicateFinder::new().group(&output.records, &NullReporter);
//!
//! for group in &report.groups {
//!     let decision = resolve(group, KeepStrategy::KeepOldest);
//!     println!("keep {}", decision.keep.path().display());
//! }
//! ```
//!
//! # Archive Planning
//!
//! ```rust,no_run
//! use tidyfile_analyze::AgeFilter;
//! use tidyfile_scan::{Enumerator, ScanConfig};
//!
//! let output = Enumerator::new().scan(&ScanConfig::new("/path/to/scan")).unwrap();
//! let plans = AgeFilter::new().filter(&output.records, 30, true).unwrap();
//!
//! for plan in &plans {
//!     println!("{} -> {}", plan.len(), plan.destination_bundle_path.display());
//! }
//! ```

pub mod age;
mod duplicates;
mod fingerprint;
mod resolve;

pub use age::{
    file_age, format_age, AgeFilter, AgeFilterConfig, AgeFilterConfigBuilder, ArchivePlan,
    UNCATEGORIZED,
};
pub use duplicates::{DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport};
pub use fingerprint::Fingerprinter;
pub use resolve::{resolve, resolve_all, KeepDecision};

// Re-export core types
pub use tidyfile_core::{FileRecord, Fingerprint, KeepStrategy};
