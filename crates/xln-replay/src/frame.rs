use serde::{Deserialize, Serialize};

use xln_core::{StateHash, Tick};

use crate::state::{ServerInput, ServerInputOutcome};

/// One applied input and what happened when it was applied, as recorded
/// into a `ServerFrame`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerInputRecord {
    pub input: ServerInput,
    pub outcome: ServerInputOutcome,
}

/// The committed record of a single tick of the reducer loop: every input
/// it was fed, in the order they were applied, and the resulting state
/// hash (spec §4.3 "Server frame", §4.5 "Replay").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFrame {
    pub tick: Tick,
    pub records: Vec<ServerInputRecord>,
    pub state_hash: StateHash,
}
