//! Core types and traits for tidyfile.
//!
//! This crate provides the data model shared by every tidyfile pipeline:
//! file records and fingerprints, the error taxonomy, configuration and
//! settings, category classifiers and the reporter interface.

mod classify;
mod config;
mod error;
mod naming;
mod record;
mod report;
mod settings;
mod strategy;

pub use classify::{
    default_invoice_keywords, Classifier, ClassifierKind, DownloadsClassifier,
    ExtensionClassifier, TypeClassifier, Unclassified, FINANCE_CATEGORY, MEDIA_CATEGORY,
    NO_EXTENSION,
};
pub use config::{CategoryMap, CategoryRule, ScanConfig, ScanConfigBuilder, OTHER_CATEGORY};
pub use error::{FailureKind, FileFailure, Result, TidyError};
pub use naming::{disambiguate, disambiguate_name, sanitize_component};
pub use record::{FileRecord, Fingerprint};
pub use report::{Event, EventKind, NullReporter, RecordingReporter, Reporter, Tee, TracingReporter};
pub use settings::{validate_date_format, Settings, DEFAULT_CHUNK_SIZE};
pub use strategy::KeepStrategy;
