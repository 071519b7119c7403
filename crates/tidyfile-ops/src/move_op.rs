//! Planned moves and the move primitive shared by organize and rename.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tidyfile_core::{disambiguate, Event, FailureKind, FileFailure, Reporter};

use crate::progress::{OperationComplete, OperationType};

/// One file and where it should go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A file left where it is, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Moves computed up front, before anything is touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    pub moves: Vec<PlannedMove>,
    pub skipped: Vec<SkippedFile>,
}

/// What applying a [`MovePlan`] did (or would do).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    /// Moves performed. `to` is the final path, which may differ from the
    /// plan if the target appeared in the meantime.
    pub moved: Vec<PlannedMove>,
    /// Moves a non-dry run would perform.
    pub would_move: Vec<PlannedMove>,
    /// Files deliberately left alone.
    pub skipped: Vec<SkippedFile>,
    /// Moves that failed.
    pub failed: Vec<FileFailure>,
}

impl MoveReport {
    /// Completion summary for display.
    pub fn complete(&self, operation_type: OperationType, dry_run: bool) -> OperationComplete {
        OperationComplete {
            operation_type,
            dry_run,
            succeeded: if dry_run {
                self.would_move.len()
            } else {
                self.moved.len()
            },
            failed: self.failed.len(),
            skipped: self.skipped.len(),
        }
    }
}

/// Carry out `plan`, never overwriting an existing file.
///
/// With `dry_run` nothing is touched and every move is reported as
/// would-move. `failure_kind` labels failures (`Move` or `Rename`).
pub fn apply_moves(
    plan: &MovePlan,
    dry_run: bool,
    failure_kind: FailureKind,
    reporter: &dyn Reporter,
) -> MoveReport {
    let mut report = MoveReport {
        skipped: plan.skipped.clone(),
        ..MoveReport::default()
    };

    for skipped in &plan.skipped {
        reporter.report(&Event::Skipped {
            path: &skipped.path,
            reason: &skipped.reason,
        });
    }

    for planned in &plan.moves {
        if dry_run {
            reporter.report(&Event::WouldMove {
                from: &planned.from,
                to: &planned.to,
            });
            report.would_move.push(planned.clone());
            continue;
        }

        let Some(target) = disambiguate(&planned.to, Path::exists) else {
            let failure = FileFailure::new(&planned.from, "no free target name", failure_kind);
            reporter.report(&Event::Failed { failure: &failure });
            report.failed.push(failure);
            continue;
        };

        match move_file(&planned.from, &target) {
            Ok(()) => {
                reporter.report(&Event::Moved {
                    from: &planned.from,
                    to: &target,
                });
                report.moved.push(PlannedMove {
                    from: planned.from.clone(),
                    to: target,
                });
            }
            Err(err) => {
                let failure = FileFailure::from_io(&planned.from, &err, failure_kind);
                reporter.report(&Event::Failed { failure: &failure });
                report.failed.push(failure);
            }
        }
    }

    report
}

/// Move a file, creating the target's parent directory.
///
/// Falls back to copy + remove when a rename cannot cross filesystems.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(err) => Err(err),
    }
}
