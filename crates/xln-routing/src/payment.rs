use serde::{Deserialize, Serialize};

use xln_account::{Account, Direction};
use xln_core::{AccountKey, Amount, EntityId, TokenId, TxId};
use xln_entity::{AccountTx, EntityTx};

use crate::error::RoutingError;

/// Per-hop state of an in-flight multi-hop payment (spec §4.4 "Two-phase
/// hop").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopStatus {
    Pending,
    Reserved,
    Committed,
    Released,
}

/// Tracks one multi-hop payment across its path: which hops have
/// reserved, committed, or released, and the payment's reservation
/// deadline (spec §4.4, §5 "Cancellation & timeouts").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiHopPayment {
    pub id: TxId,
    pub path: Vec<EntityId>,
    pub token_id: TokenId,
    pub amount: Amount,
    pub hop_status: Vec<HopStatus>,
    pub expires_at_tick: u64,
}

impl MultiHopPayment {
    pub fn new(id: TxId, path: Vec<EntityId>, token_id: TokenId, amount: Amount, expires_at_tick: u64) -> Self {
        let hop_count = path.len().saturating_sub(1);
        MultiHopPayment {
            id,
            path,
            token_id,
            amount,
            hop_status: vec![HopStatus::Pending; hop_count],
            expires_at_tick,
        }
    }

    pub fn hop_count(&self) -> usize {
        self.hop_status.len()
    }

    pub fn hop_pair(&self, hop_index: usize) -> (EntityId, EntityId) {
        (self.path[hop_index], self.path[hop_index + 1])
    }

    pub fn is_fully_reserved(&self) -> bool {
        self.hop_status.iter().all(|s| matches!(s, HopStatus::Reserved))
    }

    pub fn is_fully_committed(&self) -> bool {
        self.hop_status.iter().all(|s| matches!(s, HopStatus::Committed))
    }

    pub fn any_released(&self) -> bool {
        self.hop_status.iter().any(|s| matches!(s, HopStatus::Released))
    }
}

/// Canonical direction of value flow for a hop `(from, to)`: whichever of
/// `LeftToRight` / `RightToLeft` moves the account's delta from `from`
/// toward `to` (account orientation is fixed by `AccountKey`, independent
/// of which side initiated the hop).
pub fn direction_for_hop(from: EntityId, to: EntityId) -> Direction {
    let key = AccountKey::new(from, to);
    if from == key.left {
        Direction::LeftToRight
    } else {
        Direction::RightToLeft
    }
}

/// Reserve phase for one hop: record a pending-payment marker on `account`
/// (spec §4.4 "Reserve"). `account` is whichever replica the caller is
/// currently advancing; the server applies this identically to both
/// counterparties' replicas.
pub fn reserve_hop(
    account: &mut Account,
    payment: &MultiHopPayment,
    hop_index: usize,
) -> Result<(), RoutingError> {
    let (from, to) = payment.hop_pair(hop_index);
    let direction = direction_for_hop(from, to);
    account
        .reserve_payment(
            payment.id,
            payment.token_id,
            payment.amount,
            direction,
            payment.expires_at_tick,
        )
        .map_err(|_| RoutingError::InsufficientCapacity { hop_index })
}

/// Commit phase for one hop: apply the reserved delta change and clear
/// the marker (spec §4.4 "Commit").
pub fn commit_hop(account: &mut Account, payment: &MultiHopPayment) -> Result<(), RoutingError> {
    account
        .commit_reserve(payment.id)
        .map_err(|_| RoutingError::CounterpartyUnavailable { hop_index: 0 })
}

/// Release a hop's reserve without applying it (failure or timeout
/// rollback path).
pub fn release_hop(account: &mut Account, payment: &MultiHopPayment) {
    account.release_reserve(payment.id);
}

/// Build the `EntityTx` that the server submits to *both* counterparties'
/// entities to reserve one hop (spec §4.4, §9 "replica reconciliation":
/// both replicas advance identically by applying the same tx).
pub fn reserve_hop_tx(payment: &MultiHopPayment, hop_index: usize) -> EntityTx {
    let (from, to) = payment.hop_pair(hop_index);
    EntityTx::AccountInput {
        from_entity_id: from,
        to_entity_id: to,
        account_tx: AccountTx::ReservePayment {
            payment_id: payment.id,
            token_id: payment.token_id,
            amount: payment.amount,
            direction: direction_for_hop(from, to),
            expires_at_tick: payment.expires_at_tick,
        },
        metadata: None,
    }
}

pub fn commit_hop_tx(payment: &MultiHopPayment, hop_index: usize) -> EntityTx {
    let (from, to) = payment.hop_pair(hop_index);
    EntityTx::AccountInput {
        from_entity_id: from,
        to_entity_id: to,
        account_tx: AccountTx::CommitReserve { payment_id: payment.id },
        metadata: None,
    }
}

pub fn release_hop_tx(payment: &MultiHopPayment, hop_index: usize) -> EntityTx {
    let (from, to) = payment.hop_pair(hop_index);
    EntityTx::AccountInput {
        from_entity_id: from,
        to_entity_id: to,
        account_tx: AccountTx::ReleaseReserve { payment_id: payment.id },
        metadata: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_account::TokenLine;

    fn account_with_line(a: EntityId, b: EntityId, collateral: u128) -> Account {
        let key = AccountKey::new(a, b);
        let mut acc = Account::new(key);
        acc.lines.insert(
            1,
            TokenLine {
                collateral,
                left_credit_limit: 0,
                right_credit_limit: 0,
                delta: 0,
                last_jurisdiction_height: 0,
            },
        );
        acc
    }

    #[test]
    fn reserve_then_commit_moves_delta() {
        let a = EntityId([1u8; 32]);
        let b = EntityId([2u8; 32]);
        let mut account = account_with_line(a, b, 1000);
        let payment = MultiHopPayment::new(TxId::from_bytes([7u8; 32]), vec![a, b], 1, 200, 10);
        reserve_hop(&mut account, &payment, 0).unwrap();
        assert!(!account.pending_reserves.is_empty());
        commit_hop(&mut account, &payment).unwrap();
        assert!(account.pending_reserves.is_empty());
    }

    #[test]
    fn reserve_rejected_when_capacity_insufficient() {
        let a = EntityId([1u8; 32]);
        let b = EntityId([2u8; 32]);
        let mut account = account_with_line(a, b, 100);
        let payment = MultiHopPayment::new(TxId::from_bytes([7u8; 32]), vec![a, b], 1, 200, 10);
        let err = reserve_hop(&mut account, &payment, 3).unwrap_err();
        assert_eq!(err, RoutingError::InsufficientCapacity { hop_index: 3 });
    }
}
