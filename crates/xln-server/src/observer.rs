use serde::{Deserialize, Serialize};

use xln_core::{Amount, EntityId, Tick, TokenId, TxId};

/// Events a replay observer (RPC subscriber, wallet UI, test harness) can
/// react to without re-deriving them from raw frame diffs (spec §6
/// "Observer events").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ObserverEvent {
    TransactionApplied { entity_id: EntityId, tick: Tick },
    FrameCommitted { entity_id: EntityId, tick: Tick, height: xln_core::Height },
    PaymentReserved { payment_id: TxId, hop_index: usize, tick: Tick },
    PaymentCompleted { payment_id: TxId, tick: Tick },
    PaymentFailed { payment_id: Option<TxId>, reason: String, tick: Tick },
    ReserveUpdated { entity_id: EntityId, counterparty: EntityId, token_id: TokenId, tick: Tick },
    CollateralUpdated { entity_id: EntityId, counterparty: EntityId, token_id: TokenId, new_collateral: Amount, tick: Tick },
}
