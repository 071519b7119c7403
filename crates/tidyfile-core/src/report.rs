//! Observer interface for per-file outcomes.
//!
//! Components never print. They notify an injected [`Reporter`] and return
//! structured results; the caller decides how (or whether) to display them.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::FileFailure;
use crate::record::Fingerprint;

/// A single per-file (or per-bundle) outcome.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A file's content was fingerprinted.
    Fingerprinted {
        path: &'a Path,
        fingerprint: &'a Fingerprint,
    },
    /// A duplicate group was found.
    DuplicateGroup {
        fingerprint: &'a Fingerprint,
        members: usize,
    },
    /// A file was chosen as the one to keep.
    Kept { path: &'a Path },
    /// A file was written into a bundle.
    Archived { bundle: &'a Path, path: &'a Path },
    /// A bundle was finalized and verified.
    BundleCreated { bundle: &'a Path, entries: usize },
    /// A bundle would be created (dry run).
    WouldCreateBundle { bundle: &'a Path, entries: usize },
    /// A file was deleted.
    Deleted { path: &'a Path },
    /// A file would be deleted (dry run).
    WouldDelete { path: &'a Path },
    /// A file was moved or renamed.
    Moved { from: &'a Path, to: &'a Path },
    /// A file would be moved or renamed (dry run).
    WouldMove { from: &'a Path, to: &'a Path },
    /// A file was skipped on purpose.
    Skipped { path: &'a Path, reason: &'a str },
    /// A per-file operation failed.
    Failed { failure: &'a FileFailure },
}

/// Discriminant of an [`Event`], without borrowed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Fingerprinted,
    DuplicateGroup,
    Kept,
    Archived,
    BundleCreated,
    WouldCreateBundle,
    Deleted,
    WouldDelete,
    Moved,
    WouldMove,
    Skipped,
    Failed,
}

impl Event<'_> {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Fingerprinted { .. } => EventKind::Fingerprinted,
            Self::DuplicateGroup { .. } => EventKind::DuplicateGroup,
            Self::Kept { .. } => EventKind::Kept,
            Self::Archived { .. } => EventKind::Archived,
            Self::BundleCreated { .. } => EventKind::BundleCreated,
            Self::WouldCreateBundle { .. } => EventKind::WouldCreateBundle,
            Self::Deleted { .. } => EventKind::Deleted,
            Self::WouldDelete { .. } => EventKind::WouldDelete,
            Self::Moved { .. } => EventKind::Moved,
            Self::WouldMove { .. } => EventKind::WouldMove,
            Self::Skipped { .. } => EventKind::Skipped,
            Self::Failed { .. } => EventKind::Failed,
        }
    }

    /// The primary path the event is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Fingerprinted { path, .. }
            | Self::Kept { path }
            | Self::Archived { path, .. }
            | Self::Deleted { path }
            | Self::WouldDelete { path }
            | Self::Skipped { path, .. } => Some(path),
            Self::BundleCreated { bundle, .. } | Self::WouldCreateBundle { bundle, .. } => {
                Some(bundle)
            }
            Self::Moved { from, .. } | Self::WouldMove { from, .. } => Some(from),
            Self::Failed { failure } => Some(&failure.path),
            Self::DuplicateGroup { .. } => None,
        }
    }
}

/// Receives outcomes as components produce them.
///
/// Fingerprinting may run on several threads, hence `Send + Sync`.
pub trait Reporter: Send + Sync {
    /// Handle one event.
    fn report(&self, event: &Event<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &Event<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &Event<'_>) {
        match *event {
            Event::Fingerprinted { path, fingerprint } => {
                tracing::debug!(path = %path.display(), hash = %fingerprint.short(), "fingerprinted");
            }
            Event::DuplicateGroup {
                fingerprint,
                members,
            } => {
                tracing::info!(hash = %fingerprint.short(), members, "duplicate group");
            }
            Event::Kept { path } => tracing::debug!(path = %path.display(), "keeping"),
            Event::Archived { bundle, path } => {
                tracing::info!(bundle = %bundle.display(), path = %path.display(), "archived");
            }
            Event::BundleCreated { bundle, entries } => {
                tracing::info!(bundle = %bundle.display(), entries, "created archive");
            }
            Event::WouldCreateBundle { bundle, entries } => {
                tracing::info!(bundle = %bundle.display(), entries, "[dry run] would create archive");
            }
            Event::Deleted { path } => tracing::info!(path = %path.display(), "deleted"),
            Event::WouldDelete { path } => {
                tracing::info!(path = %path.display(), "[dry run] would delete");
            }
            Event::Moved { from, to } => {
                tracing::info!(from = %from.display(), to = %to.display(), "moved");
            }
            Event::WouldMove { from, to } => {
                tracing::info!(from = %from.display(), to = %to.display(), "[dry run] would move");
            }
            Event::Skipped { path, reason } => {
                tracing::debug!(path = %path.display(), reason, "skipped");
            }
            Event::Failed { failure } => {
                tracing::warn!(path = %failure.path.display(), kind = %failure.kind, "{}", failure.message);
            }
        }
    }
}

/// Keeps `(kind, path)` pairs in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(EventKind, Option<PathBuf>)>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<(EventKind, Option<PathBuf>)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events of one kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|(k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    /// Paths of recorded events of one kind, in arrival order.
    pub fn paths(&self, kind: EventKind) -> Vec<PathBuf> {
        self.events
            .lock()
            .map(|e| {
                e.iter()
                    .filter(|(k, _)| *k == kind)
                    .filter_map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &Event<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event.kind(), event.path().map(Path::to_path_buf)));
        }
    }
}

/// Sends every event to two reporters.
pub struct Tee<'a>(pub &'a dyn Reporter, pub &'a dyn Reporter);

impl Reporter for Tee<'_> {
    fn report(&self, event: &Event<'_>) {
        self.0.report(event);
        self.1.report(event);
    }
}
