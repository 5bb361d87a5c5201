use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use xln_core::{EntityId, SignerId, StateHash, Tick};
use xln_entity::{Entity, EntityTx};

/// One command the single-writer loop may feed the reducer on a given
/// tick (spec §4.3, §4.5). Carries enough to be replayed byte-for-byte:
/// no wall-clock reads, no randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ServerInput {
    SubmitEntityTx { entity_id: EntityId, tx: EntityTx },
    Propose { entity_id: EntityId },
    ReceiveSignature { entity_id: EntityId, signer: SignerId, signature: Vec<u8> },
    CheckTimeouts { consensus_timeout_ticks: u64, reserve_now_tick: u64 },
}

/// Per-input result recorded into the `ServerFrame` so a replay observer
/// can see what happened without re-deriving it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ServerInputOutcome {
    Applied,
    Rejected { reason: String },
}

/// The full, canonically-hashable global state: every entity replica the
/// node currently hosts (spec §3 "Server state").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReplayState {
    pub entities: BTreeMap<EntityId, Entity>,
}

impl ReplayState {
    pub fn new() -> Self {
        ReplayState { entities: BTreeMap::new() }
    }

    /// Canonical hash of the whole server state. `BTreeMap` iteration is
    /// already key-ascending, so this needs no explicit sort.
    pub fn state_hash(&self) -> StateHash {
        let bytes = bincode::serialize(&self.entities).expect("ReplayState serialization is infallible");
        xln_crypto::hash::state_hash(&bytes)
    }

    /// Apply one `ServerInput` against live state, translating any
    /// entity-level error into a recorded rejection rather than
    /// propagating it — the frame log is the place failures are
    /// observed, not a panic (spec §7 "Propagation policy"). `tick` is
    /// the enclosing `ServerFrame`'s tick, used to timestamp proposed
    /// candidates.
    pub fn apply(&mut self, input: &ServerInput, tick: Tick) -> ServerInputOutcome {
        match input {
            ServerInput::SubmitEntityTx { entity_id, tx } => {
                let Some(entity) = self.entities.get_mut(entity_id) else {
                    return ServerInputOutcome::Rejected { reason: "unknown entity".into() };
                };
                match entity.submit_tx(tx.clone()) {
                    Ok(_) => ServerInputOutcome::Applied,
                    Err(e) => ServerInputOutcome::Rejected { reason: e.to_string() },
                }
            }
            ServerInput::Propose { entity_id } => {
                let Some(entity) = self.entities.get_mut(entity_id) else {
                    return ServerInputOutcome::Rejected { reason: "unknown entity".into() };
                };
                match entity.propose(tick) {
                    Ok(()) => ServerInputOutcome::Applied,
                    Err(e) => ServerInputOutcome::Rejected { reason: e.to_string() },
                }
            }
            ServerInput::ReceiveSignature { entity_id, signer, signature } => {
                let Some(entity) = self.entities.get_mut(entity_id) else {
                    return ServerInputOutcome::Rejected { reason: "unknown entity".into() };
                };
                match entity.receive_signature(*signer, signature.clone()) {
                    Ok(_) => ServerInputOutcome::Applied,
                    Err(e) => ServerInputOutcome::Rejected { reason: e.to_string() },
                }
            }
            ServerInput::CheckTimeouts { consensus_timeout_ticks, reserve_now_tick } => {
                for entity in self.entities.values_mut() {
                    entity.check_timeout(*reserve_now_tick, *consensus_timeout_ticks);
                    for account in entity.accounts.values_mut() {
                        account.expire_reserves(*reserve_now_tick);
                    }
                }
                ServerInputOutcome::Applied
            }
        }
    }
}
