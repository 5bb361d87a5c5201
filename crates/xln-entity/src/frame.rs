use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use xln_core::{Height, SignerId, StateHash, TxId};

use crate::tx::EntityTx;

/// States of the per-entity consensus state machine (spec §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusPhase {
    Idle,
    Proposing,
    AwaitingSignatures,
    Committed,
    Aborted,
}

/// Free-text narrative attached to a frame for replay observers (spec §3
/// "Frame").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Outcome of applying one mempool transaction within a frame. Ledger and
/// routing failures are recorded rather than dropped (spec §7
/// "Propagation policy").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    Applied,
    Failed { reason: String },
}

/// An immutable, committed batch of transactions at one consensus step
/// (spec §3 "Frame").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    pub parent_hash: StateHash,
    pub height: Height,
    pub proposer: SignerId,
    pub signatures: BTreeMap<SignerId, Vec<u8>>,
    pub txs: Vec<(TxId, EntityTx, TxOutcome)>,
    pub post_state_hash: StateHash,
    pub narrative: Narrative,
}

/// A frame still being built and signed; not yet part of history.
#[derive(Clone, Debug)]
pub struct CandidateFrame {
    pub frame: Frame,
    pub proposed_at_tick: u64,
}
