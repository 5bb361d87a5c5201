use std::collections::VecDeque;

use tokio::sync::mpsc;

use xln_core::{CoreError, Tick, TxId, DEFAULT_DEDUP_WINDOW_TICKS, DEFAULT_INGRESS_QUEUE_BOUND};
use xln_replay::ServerInput;

/// Bounded submission channel into the tick loop, with a sliding dedup
/// window so resubmitting the same `SubmitEntityTx` within
/// `DEFAULT_DEDUP_WINDOW_TICKS` ticks is a no-op rather than a double
/// application (spec §4.3 "Ingress").
pub struct Ingress {
    sender: mpsc::Sender<ServerInput>,
    receiver: mpsc::Receiver<ServerInput>,
    recent: VecDeque<(Tick, TxId)>,
}

impl Ingress {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(DEFAULT_INGRESS_QUEUE_BOUND);
        Ingress { sender, receiver, recent: VecDeque::new() }
    }

    /// A clonable handle callers use to submit inputs from other tasks
    /// (RPC handlers, the P2P inbound pipe).
    pub fn handle(&self) -> mpsc::Sender<ServerInput> {
        self.sender.clone()
    }

    /// Non-blocking submission, surfacing backpressure as `QueueFull`
    /// rather than blocking the caller (spec §5 "Bounded ingress").
    pub fn try_submit(&self, input: ServerInput) -> Result<(), CoreError> {
        self.sender.try_send(input).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CoreError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => CoreError::Other("ingress channel closed".into()),
        })
    }

    fn dedup_key(input: &ServerInput) -> Option<TxId> {
        match input {
            ServerInput::SubmitEntityTx { tx, .. } => {
                let bytes = bincode::serialize(tx).ok()?;
                Some(xln_crypto::hash::tx_id_from_body(&bytes))
            }
            _ => None,
        }
    }

    /// Drain everything currently queued, dropping duplicates seen within
    /// the dedup window (spec §4.3 "Duplicate suppression").
    pub fn drain(&mut self, now_tick: Tick) -> Vec<ServerInput> {
        let mut out = Vec::new();
        while let Ok(input) = self.receiver.try_recv() {
            if let Some(id) = Self::dedup_key(&input) {
                if self.recent.iter().any(|(_, seen)| *seen == id) {
                    continue;
                }
                self.recent.push_back((now_tick, id));
            }
            out.push(input);
        }
        while let Some((t, _)) = self.recent.front() {
            if now_tick.saturating_sub(*t) > DEFAULT_DEDUP_WINDOW_TICKS {
                self.recent.pop_front();
            } else {
                break;
            }
        }
        out
    }
}

impl Default for Ingress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_core::EntityId;
    use xln_entity::EntityTx;

    fn profile_update_input() -> ServerInput {
        ServerInput::SubmitEntityTx {
            entity_id: EntityId([1u8; 32]),
            tx: EntityTx::ProfileUpdate { display_name: Some("a".into()), metadata: None },
        }
    }

    #[test]
    fn duplicate_submission_within_window_is_dropped() {
        let mut ingress = Ingress::new();
        ingress.try_submit(profile_update_input()).unwrap();
        ingress.try_submit(profile_update_input()).unwrap();
        let drained = ingress.drain(1);
        assert_eq!(drained.len(), 1);
    }

    #[test]
    fn resubmission_after_window_expires_is_admitted() {
        let mut ingress = Ingress::new();
        ingress.try_submit(profile_update_input()).unwrap();
        assert_eq!(ingress.drain(1).len(), 1);
        ingress.try_submit(profile_update_input()).unwrap();
        let late_tick = 1 + DEFAULT_DEDUP_WINDOW_TICKS + 1;
        assert_eq!(ingress.drain(late_tick).len(), 1);
    }
}
