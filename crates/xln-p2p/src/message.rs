use serde::{Deserialize, Serialize};

use xln_core::{EntityId, SignerId, StateHash, Tick};
use xln_entity::EntityTx;

/// Messages exchanged over the gossip network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum P2pMessage {
    /// A peer is broadcasting an entity transaction for admission into
    /// `entity_id`'s mempool on every replica.
    SubmitEntityTx { entity_id: EntityId, tx: EntityTx },

    /// A peer announces it has committed `tick` with the given state hash.
    /// Used by other replicas to detect divergence without exchanging
    /// full frames.
    FrameAnnounce { tick: Tick, state_hash: StateHash },

    /// Request a specific committed frame, identified by tick, from peers.
    RequestFrame { tick: Tick },

    /// Request the sender's current tip (latest committed tick).
    RequestTip,

    /// A peer is broadcasting a signature share for a pending proposal.
    ReceiveSignature { entity_id: EntityId, signer: SignerId, signature: Vec<u8> },
}

impl P2pMessage {
    /// Serialize to bytes for GossipSub propagation.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("P2pMessage serialization is infallible")
    }

    /// Deserialize from GossipSub bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
