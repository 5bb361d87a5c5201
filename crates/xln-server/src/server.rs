use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use xln_core::{Tick, DEFAULT_RESERVE_TIMEOUT_TICKS, DEFAULT_SNAPSHOT_INTERVAL_FRAMES};
use xln_replay::{reduce, History, ReplayState, ServerFrame, ServerInput, ServerInputOutcome};
use xln_state::StateDb;

use crate::error::ServerError;
use crate::ingress::Ingress;
use crate::observer::ObserverEvent;
use crate::orchestrator::PaymentOrchestrator;

/// Single-writer tick loop: the only place `ReplayState` is mutated (spec
/// §4.3 "Single writer, no overlapping ticks"). Every tick drains the
/// bounded ingress queue, folds it through the pure reducer, persists the
/// result, and broadcasts observer events — in that fixed order, so two
/// runs fed the same inputs produce the same frames regardless of wall
/// clock (spec §4.5 "Deterministic replay").
pub struct Server {
    state: ReplayState,
    history: History,
    db: Option<Arc<StateDb>>,
    tick: Tick,
    ingress: Ingress,
    observer_tx: broadcast::Sender<ObserverEvent>,
    pub orchestrator: PaymentOrchestrator,
    consensus_timeout_ticks: u64,
}

impl Server {
    pub fn new(genesis: ReplayState, db: Option<Arc<StateDb>>) -> Self {
        Server {
            state: genesis,
            history: History::new(DEFAULT_SNAPSHOT_INTERVAL_FRAMES),
            db,
            tick: 0,
            ingress: Ingress::new(),
            observer_tx: broadcast::channel(1024).0,
            orchestrator: PaymentOrchestrator::new(),
            consensus_timeout_ticks: DEFAULT_RESERVE_TIMEOUT_TICKS,
        }
    }

    pub fn ingress_handle(&self) -> mpsc::Sender<ServerInput> {
        self.ingress.handle()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ObserverEvent> {
        self.observer_tx.subscribe()
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Drain the ingress queue, advance one tick through the pure
    /// reducer, persist, and publish observer events. Always injects a
    /// `CheckTimeouts` input so expired candidate frames and payment
    /// reserves are swept deterministically every tick (spec §5
    /// "Cancellation & timeouts").
    pub async fn tick_once(&mut self) -> Result<ServerFrame, ServerError> {
        self.tick += 1;
        let mut inputs = self.ingress.drain(self.tick);
        inputs.push(ServerInput::CheckTimeouts {
            consensus_timeout_ticks: self.consensus_timeout_ticks,
            reserve_now_tick: self.tick,
        });

        let state = std::mem::take(&mut self.state);
        let (next_state, frame) = reduce(state, self.tick, inputs);
        self.state = next_state;

        if let Some(db) = &self.db {
            db.put_frame(&frame)?;
            db.save_replay_state(&self.state)?;
        }
        self.history.append(frame.clone(), &self.state);
        self.publish(&frame);
        Ok(frame)
    }

    fn publish(&self, frame: &ServerFrame) {
        for record in &frame.records {
            let event = match (&record.input, &record.outcome) {
                (ServerInput::SubmitEntityTx { entity_id, .. }, ServerInputOutcome::Applied) => {
                    ObserverEvent::TransactionApplied { entity_id: *entity_id, tick: frame.tick }
                }
                (ServerInput::Propose { entity_id }, ServerInputOutcome::Applied) => {
                    let height = self.state.entities.get(entity_id).map(|e| e.height).unwrap_or(0);
                    ObserverEvent::FrameCommitted { entity_id: *entity_id, tick: frame.tick, height }
                }
                (_, ServerInputOutcome::Rejected { reason }) => {
                    debug!(reason = %reason, tick = frame.tick, "input rejected");
                    ObserverEvent::PaymentFailed { payment_id: None, reason: reason.clone(), tick: frame.tick }
                }
                _ => continue,
            };
            // No subscribers yet is not an error: observers attach later.
            let _ = self.observer_tx.send(event);
        }
    }

    /// Run the tick loop forever at a fixed cadence, until the enclosing
    /// task is dropped or cancelled.
    pub async fn run(&mut self, tick_interval: Duration) {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick_once().await {
                warn!(error = %e, "tick failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_core::{Config, EntityId, Side, SignerId};
    use xln_entity::{AccountTx, Entity, EntityTx};

    fn server_with_entity() -> (Server, EntityId, EntityId) {
        let me = EntityId([1u8; 32]);
        let peer = EntityId([2u8; 32]);
        let mut genesis = ReplayState::new();
        genesis.entities.insert(me, Entity::new(me, vec![SignerId([1u8; 32])], Config::default()));
        (Server::new(genesis, None), me, peer)
    }

    #[tokio::test]
    async fn tick_applies_queued_submission_and_advances_tick() {
        let (mut server, me, peer) = server_with_entity();
        let handle = server.ingress_handle();
        handle
            .send(ServerInput::SubmitEntityTx {
                entity_id: me,
                tx: EntityTx::AccountInput {
                    from_entity_id: me,
                    to_entity_id: peer,
                    account_tx: AccountTx::CreditLimit { side: Side::Left, token_id: 1, new_limit: 100 },
                    metadata: None,
                },
            })
            .await
            .unwrap();

        let frame = server.tick_once().await.unwrap();
        assert_eq!(frame.tick, 1);
        assert!(frame.records.iter().any(|r| matches!(r.outcome, ServerInputOutcome::Applied)));
        assert_eq!(server.current_tick(), 1);
    }

    #[tokio::test]
    async fn unknown_entity_submission_is_rejected_and_observable() {
        let (mut server, _me, peer) = server_with_entity();
        let mut observer = server.subscribe();
        server
            .ingress_handle()
            .send(ServerInput::Propose { entity_id: peer })
            .await
            .unwrap();
        server.tick_once().await.unwrap();
        let event = observer.try_recv().unwrap();
        assert!(matches!(event, ObserverEvent::PaymentFailed { .. }));
    }
}
