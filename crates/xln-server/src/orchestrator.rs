use std::collections::BTreeMap;

use xln_core::{Amount, EntityId, TokenId, TxId};
use xln_entity::EntityTx;
use xln_replay::ServerInput;
use xln_routing::{commit_hop_tx, find_route, release_hop_tx, reserve_hop_tx, CapacityView, HopStatus, MultiHopPayment, RoutingError};

/// Tracks in-flight multi-hop payments and turns each phase transition
/// into the `ServerInput`s the tick loop must feed to both replicas of
/// every hop account (spec §4.4 "Two-phase hop", §9 "replica
/// reconciliation": the same tx content is submitted to both
/// counterparty entities so their replicas evolve identically).
#[derive(Default)]
pub struct PaymentOrchestrator {
    payments: BTreeMap<TxId, MultiHopPayment>,
}

impl PaymentOrchestrator {
    pub fn new() -> Self {
        PaymentOrchestrator { payments: BTreeMap::new() }
    }

    /// Find a route and register a new multi-hop payment (spec §4.4
    /// "Route selection").
    pub fn start(
        &mut self,
        graph: &impl CapacityView,
        sender: EntityId,
        receiver: EntityId,
        token_id: TokenId,
        amount: Amount,
        max_hops: u8,
        payment_id: TxId,
        expires_at_tick: u64,
    ) -> Result<MultiHopPayment, RoutingError> {
        let path = find_route(graph, sender, receiver, token_id, amount, max_hops)?;
        let payment = MultiHopPayment::new(payment_id, path, token_id, amount, expires_at_tick);
        self.payments.insert(payment_id, payment.clone());
        Ok(payment)
    }

    pub fn get(&self, payment_id: TxId) -> Option<&MultiHopPayment> {
        self.payments.get(&payment_id)
    }

    pub fn remove(&mut self, payment_id: TxId) -> Option<MultiHopPayment> {
        self.payments.remove(&payment_id)
    }

    /// The two `ServerInput`s that reserve hop `hop_index` — one per
    /// replica of that hop's account.
    pub fn reserve_inputs(&self, payment_id: TxId, hop_index: usize) -> Option<[ServerInput; 2]> {
        let payment = self.payments.get(&payment_id)?;
        Some(hop_inputs_for(payment, reserve_hop_tx(payment, hop_index), hop_index))
    }

    pub fn commit_inputs(&self, payment_id: TxId, hop_index: usize) -> Option<[ServerInput; 2]> {
        let payment = self.payments.get(&payment_id)?;
        Some(hop_inputs_for(payment, commit_hop_tx(payment, hop_index), hop_index))
    }

    pub fn release_inputs(&self, payment_id: TxId, hop_index: usize) -> Option<[ServerInput; 2]> {
        let payment = self.payments.get(&payment_id)?;
        Some(hop_inputs_for(payment, release_hop_tx(payment, hop_index), hop_index))
    }

    pub fn mark_hop(&mut self, payment_id: TxId, hop_index: usize, status: HopStatus) {
        if let Some(payment) = self.payments.get_mut(&payment_id) {
            if let Some(slot) = payment.hop_status.get_mut(hop_index) {
                *slot = status;
            }
        }
    }
}

fn hop_inputs_for(payment: &MultiHopPayment, tx: EntityTx, hop_index: usize) -> [ServerInput; 2] {
    let (from, to) = payment.hop_pair(hop_index);
    [
        ServerInput::SubmitEntityTx { entity_id: from, tx: tx.clone() },
        ServerInput::SubmitEntityTx { entity_id: to, tx },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    struct MockGraph {
        edges: Map<(EntityId, EntityId), Amount>,
    }

    impl CapacityView for MockGraph {
        fn out_capacity(&self, from: EntityId, to: EntityId, _token_id: TokenId) -> Amount {
            *self.edges.get(&(from, to)).unwrap_or(&0)
        }
        fn neighbors(&self, of: EntityId) -> Vec<EntityId> {
            self.edges.keys().filter_map(|(f, t)| if *f == of { Some(*t) } else { None }).collect()
        }
    }

    fn eid(n: u8) -> EntityId {
        EntityId([n; 32])
    }

    #[test]
    fn start_then_reserve_inputs_cover_every_hop() {
        let mut edges = Map::new();
        edges.insert((eid(1), eid(2)), 1000);
        edges.insert((eid(2), eid(3)), 1000);
        let graph = MockGraph { edges };
        let mut orchestrator = PaymentOrchestrator::new();
        let payment_id = TxId::from_bytes([9u8; 32]);
        let payment = orchestrator.start(&graph, eid(1), eid(3), 1, 100, 4, payment_id, 10).unwrap();
        assert_eq!(payment.hop_count(), 2);

        for hop in 0..payment.hop_count() {
            let inputs = orchestrator.reserve_inputs(payment_id, hop).unwrap();
            assert_eq!(inputs.len(), 2);
            orchestrator.mark_hop(payment_id, hop, HopStatus::Reserved);
        }
        assert!(orchestrator.get(payment_id).unwrap().is_fully_reserved());
    }
}
