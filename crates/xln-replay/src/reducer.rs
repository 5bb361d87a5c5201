use xln_core::Tick;

use crate::frame::{ServerFrame, ServerInputRecord};
use crate::state::{ReplayState, ServerInput};

/// Pure step function: `(state, tick, inputs) -> (state', frame)`. Takes
/// ownership of `state` and returns the advanced state together with the
/// frame describing what happened, so a caller can feed the same
/// `(state, tick, inputs)` triple through this function at any later time
/// and get a byte-identical result (spec §4.5 "Deterministic replay").
///
/// Nondeterminism never enters here: `inputs` is the only thing this
/// function reads, and it is recorded verbatim into the returned frame.
pub fn reduce(mut state: ReplayState, tick: Tick, inputs: Vec<ServerInput>) -> (ReplayState, ServerFrame) {
    let mut records = Vec::with_capacity(inputs.len());
    for input in inputs {
        let outcome = state.apply(&input, tick);
        records.push(ServerInputRecord { input, outcome });
    }
    let state_hash = state.state_hash();
    let frame = ServerFrame { tick, records, state_hash };
    (state, frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_core::{Config, EntityId, SignerId};
    use xln_entity::{AccountTx, Entity, EntityTx};
    use xln_core::Side;

    fn genesis() -> (ReplayState, EntityId, EntityId) {
        let me = EntityId([1u8; 32]);
        let peer = EntityId([2u8; 32]);
        let signers = vec![SignerId([1u8; 32])];
        let mut state = ReplayState::new();
        state.entities.insert(me, Entity::new(me, signers, Config::default()));
        (state, me, peer)
    }

    #[test]
    fn reducing_the_same_inputs_twice_yields_identical_state_hash() {
        let (state, me, peer) = genesis();
        let inputs = vec![ServerInput::SubmitEntityTx {
            entity_id: me,
            tx: EntityTx::AccountInput {
                from_entity_id: me,
                to_entity_id: peer,
                account_tx: AccountTx::CreditLimit { side: Side::Left, token_id: 1, new_limit: 500 },
                metadata: None,
            },
        }];

        let (state_a, frame_a) = reduce(state.clone(), 1, inputs.clone());
        let (state_b, frame_b) = reduce(state, 1, inputs);

        assert_eq!(frame_a.state_hash, frame_b.state_hash);
        assert_eq!(state_a.state_hash(), state_b.state_hash());
    }

    #[test]
    fn unknown_entity_input_is_rejected_not_panicking() {
        let (state, _me, peer) = genesis();
        let inputs = vec![ServerInput::Propose { entity_id: peer }];
        let (_state, frame) = reduce(state, 1, inputs);
        assert!(matches!(
            frame.records[0].outcome,
            crate::state::ServerInputOutcome::Rejected { .. }
        ));
    }
}
