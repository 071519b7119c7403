//! File operations for tidyfile.
//!
//! Everything that changes the filesystem lives here: writing archive
//! bundles, deleting duplicates, organizing into category folders and
//! date-prefix renaming. Every entry point takes a `dry_run` switch that
//! keeps the full read side (plans, decisions, bundle reads) and suppresses
//! the writes, reporting what would have happened instead.
//!
//! Deletion always goes through a [`Deleter`] and [`delete_records`]; the
//! archive writer only calls it for entries already verified inside a
//! finished bundle.

mod archive;
mod dedupe;
mod delete;
mod move_op;
mod organize;
mod progress;
mod rename;

pub use archive::{
    AbortedPlan, ArchiveConfig, ArchiveConfigBuilder, ArchiveResult, ArchiveRunReport,
    ArchiveWriter, EntrySource, FsSource,
};
pub use dedupe::{DedupeConfig, DedupeConfigBuilder, DedupeSummary, Deduplicator};
pub use delete::{delete_records, Deleter, DeletionReport, FsDeleter};
pub use move_op::{apply_moves, move_file, MovePlan, MoveReport, PlannedMove, SkippedFile};
pub use organize::{OrganizeConfig, OrganizeConfigBuilder, Organizer};
pub use progress::{OperationComplete, OperationType};
pub use rename::{validate_filename, DatePrefixRenamer};

pub use zip::CompressionMethod;
