use thiserror::Error;

use xln_core::{StateHash, Tick};

/// Failure taxonomy for replay, snapshotting, and time-travel (spec §4.5).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("snapshot state hash mismatch: expected {expected}, got {actual}")]
    SnapshotHashMismatch { expected: StateHash, actual: StateHash },

    #[error("seek target tick {0} is beyond recorded history")]
    TickBeyondHistory(Tick),

    #[error("history is empty")]
    EmptyHistory,
}
