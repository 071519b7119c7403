//! Completion summaries for file operations.

use serde::{Deserialize, Serialize};

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Archive,
    Delete,
    Move,
    Rename,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Archive => write!(f, "Archive"),
            Self::Delete => write!(f, "Delete"),
            Self::Move => write!(f, "Move"),
            Self::Rename => write!(f, "Rename"),
        }
    }
}

/// Counts for a finished (or simulated) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Whether side effects were suppressed.
    pub dry_run: bool,
    /// Number of items processed (or that would be).
    pub succeeded: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Number of items deliberately left alone.
    pub skipped: usize,
}

impl OperationComplete {
    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        let action = match (self.operation_type, self.dry_run) {
            (OperationType::Archive, false) => "Archived",
            (OperationType::Delete, false) => "Deleted",
            (OperationType::Move, false) => "Moved",
            (OperationType::Rename, false) => "Renamed",
            (OperationType::Archive, true) => "Would archive",
            (OperationType::Delete, true) => "Would delete",
            (OperationType::Move, true) => "Would move",
            (OperationType::Rename, true) => "Would rename",
        };

        let mut text = format!("{} {} items", action, self.succeeded);
        if self.skipped > 0 {
            text.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            text.push_str(&format!(", {} failed", self.failed));
        }
        text
    }
}
