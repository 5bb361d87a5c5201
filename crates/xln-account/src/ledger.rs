use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use xln_core::{AccountKey, Amount, EntityId, Height, JurisdictionHeight, Side, StateHash, TokenId, TxId};

use crate::error::AccountError;

/// Direction of value movement across an account, oriented by the
/// account's canonical `(left, right)` pair rather than by local
/// perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

/// Per-token ledger line: collateral (unless `shared_collateral` is set on
/// the owning `Account`), both credit limits, and the signed delta.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLine {
    pub collateral: Amount,
    pub left_credit_limit: Amount,
    pub right_credit_limit: Amount,
    pub delta: i128,
    pub last_jurisdiction_height: JurisdictionHeight,
}

/// A capacity hold recorded during the first phase of a multi-hop payment
/// (spec §4.4 "Reserve"). Tracked per account so capacity checks for later
/// reserves, and the `inCapacity`/`outCapacity` derived view, account for
/// value that is provisionally committed but not yet applied to `delta`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReserve {
    pub token_id: TokenId,
    pub amount: Amount,
    pub direction: Direction,
    pub expires_at_tick: u64,
}

/// The seven named capacity regions produced by `deriveView`, all from a
/// single token line and a chosen perspective. `delta` is the
/// perspective-local signed position: positive means the viewer has sent
/// net value to the counterparty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub out_own_credit: Amount,
    pub in_own_credit: Amount,
    pub out_collateral: Amount,
    pub in_collateral: Amount,
    pub out_peer_credit: Amount,
    pub in_peer_credit: Amount,
    pub delta: i128,
}

impl TokenView {
    pub fn out_capacity(&self) -> Amount {
        self.out_own_credit + self.out_collateral + self.out_peer_credit
    }

    pub fn in_capacity(&self) -> Amount {
        self.in_own_credit + self.in_collateral + self.in_peer_credit
    }
}

/// A bilateral ledger between two entities (spec §3 "Account").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub key: AccountKey,
    /// When true, all tokens share a single collateral pool stored under
    /// token id 0 rather than maintaining per-token collateral. Per-token
    /// is the default (spec §9 open question).
    pub shared_collateral: bool,
    pub lines: BTreeMap<TokenId, TokenLine>,
    pub height: Height,
    pub last_committed_frame_hash: StateHash,
    pub pending_reserves: BTreeMap<TxId, PendingReserve>,
}

impl Account {
    pub fn new(key: AccountKey) -> Self {
        Account {
            key,
            shared_collateral: false,
            lines: BTreeMap::new(),
            height: 0,
            last_committed_frame_hash: StateHash::zero(),
            pending_reserves: BTreeMap::new(),
        }
    }

    fn collateral_key(&self, token_id: TokenId) -> TokenId {
        if self.shared_collateral {
            0
        } else {
            token_id
        }
    }

    fn line(&self, token_id: TokenId) -> Option<&TokenLine> {
        self.lines.get(&token_id)
    }

    // Credit limits and delta are always per-token; only `collateral` may
    // be pooled under token id 0 when `shared_collateral` is set.
    fn effective_collateral(&self, token_id: TokenId) -> Amount {
        let key = self.collateral_key(token_id);
        self.lines.get(&key).map(|l| l.collateral).unwrap_or(0)
    }

    fn reserved_sums(&self, token_id: TokenId) -> (Amount, Amount) {
        let mut ltr = 0u128;
        let mut rtl = 0u128;
        for r in self.pending_reserves.values() {
            if r.token_id != token_id {
                continue;
            }
            match r.direction {
                Direction::LeftToRight => ltr += r.amount,
                Direction::RightToLeft => rtl += r.amount,
            }
        }
        (ltr, rtl)
    }

    fn check_invariant(
        &self,
        token_id: TokenId,
        attempted_delta: i128,
    ) -> Result<(), AccountError> {
        let line = self.line(token_id).cloned().unwrap_or_default();
        let collateral = self.effective_collateral(token_id) as i128;
        let lower = -(line.left_credit_limit as i128);
        let upper = collateral + line.right_credit_limit as i128;
        if attempted_delta < lower || attempted_delta > upper {
            return Err(AccountError::CapacityExceeded {
                token_id,
                attempted: attempted_delta,
            });
        }
        Ok(())
    }

    fn require_known_token(&self, token_id: TokenId) -> Result<(), AccountError> {
        if self.lines.contains_key(&token_id) {
            Ok(())
        } else {
            Err(AccountError::UnknownToken(token_id))
        }
    }

    /// Apply an in-band payment, moving `delta` by `amount` in the given
    /// direction. Fails with `CapacityExceeded` without mutating state.
    pub fn apply_payment(
        &mut self,
        token_id: TokenId,
        amount: Amount,
        direction: Direction,
    ) -> Result<(), AccountError> {
        self.require_known_token(token_id)?;
        let current = self.lines.get(&token_id).map(|l| l.delta).unwrap_or(0);
        let signed = amount as i128;
        let attempted = match direction {
            Direction::LeftToRight => current + signed,
            Direction::RightToLeft => current - signed,
        };
        self.check_invariant(token_id, attempted)?;
        self.lines.entry(token_id).or_default().delta = attempted;
        self.height += 1;
        Ok(())
    }

    /// Reserve `amount` for a prospective multi-hop hop without yet
    /// applying it to `delta` (spec §4.4 "Reserve").
    pub fn reserve_payment(
        &mut self,
        tx_id: TxId,
        token_id: TokenId,
        amount: Amount,
        direction: Direction,
        expires_at_tick: u64,
    ) -> Result<(), AccountError> {
        self.require_known_token(token_id)?;
        let current = self.lines.get(&token_id).map(|l| l.delta).unwrap_or(0);
        let (ltr, rtl) = self.reserved_sums(token_id);
        let effective = current + ltr as i128 - rtl as i128;
        let signed = amount as i128;
        let attempted = match direction {
            Direction::LeftToRight => effective + signed,
            Direction::RightToLeft => effective - signed,
        };
        self.check_invariant(token_id, attempted)?;
        self.pending_reserves.insert(
            tx_id,
            PendingReserve {
                token_id,
                amount,
                direction,
                expires_at_tick,
            },
        );
        Ok(())
    }

    /// Commit a previously reserved payment: applies the delta change and
    /// clears the reserve marker (spec §4.4 "Commit").
    pub fn commit_reserve(&mut self, tx_id: TxId) -> Result<(), AccountError> {
        let reserve = self
            .pending_reserves
            .remove(&tx_id)
            .ok_or(AccountError::ReserveNotFound(tx_id))?;
        self.apply_payment(reserve.token_id, reserve.amount, reserve.direction)
    }

    /// Release a reserve without applying it (failure path or timeout).
    pub fn release_reserve(&mut self, tx_id: TxId) -> Option<PendingReserve> {
        self.pending_reserves.remove(&tx_id)
    }

    /// Release every reserve whose `expires_at_tick` is at or before
    /// `now_tick`, in canonical (TxId-ascending) order, returning the
    /// released tx ids (spec §5 "Cancellation & timeouts").
    pub fn expire_reserves(&mut self, now_tick: u64) -> Vec<TxId> {
        let expired: Vec<TxId> = self
            .pending_reserves
            .iter()
            .filter(|(_, r)| r.expires_at_tick <= now_tick)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.pending_reserves.remove(id);
        }
        expired
    }

    /// Update a credit limit. Lowering below current utilization fails.
    pub fn apply_credit_limit_update(
        &mut self,
        side: Side,
        token_id: TokenId,
        new_limit: Amount,
    ) -> Result<(), AccountError> {
        let line = self.lines.entry(token_id).or_default();
        let utilization = match side {
            Side::Left => {
                if line.delta < 0 {
                    (-line.delta) as u128
                } else {
                    0
                }
            }
            Side::Right => {
                let over_collateral = line.delta - line.collateral as i128;
                if over_collateral > 0 {
                    over_collateral as u128
                } else {
                    0
                }
            }
        };
        if new_limit < utilization {
            return Err(AccountError::CreditLimitBelowUtilization {
                token_id,
                requested: new_limit,
                utilization,
            });
        }
        match side {
            Side::Left => line.left_credit_limit = new_limit,
            Side::Right => line.right_credit_limit = new_limit,
        }
        self.height += 1;
        Ok(())
    }

    /// Apply a trusted off-band settlement event. Never fails on capacity
    /// grounds; rejected only if `jurisdiction_height` does not strictly
    /// advance the account's last known height for this token.
    pub fn apply_settlement(
        &mut self,
        token_id: TokenId,
        resulting_delta: i128,
        new_collateral: Amount,
        jurisdiction_height: JurisdictionHeight,
    ) -> Result<(), AccountError> {
        let line = self.lines.entry(token_id).or_default();
        if jurisdiction_height <= line.last_jurisdiction_height {
            return Err(AccountError::SettlementRegressed {
                token_id,
                attempted: jurisdiction_height,
                last_known: line.last_jurisdiction_height,
            });
        }
        line.delta = resulting_delta;
        let collateral_key = self.collateral_key(token_id);
        self.lines.entry(collateral_key).or_default().collateral = new_collateral;
        self.lines.entry(token_id).or_default().last_jurisdiction_height = jurisdiction_height;
        self.height += 1;
        Ok(())
    }

    /// Produce the seven named capacity regions for every known token,
    /// from `perspective`'s point of view (spec §4.1 "deriveView").
    pub fn derive_view(
        &self,
        perspective: EntityId,
    ) -> Result<BTreeMap<TokenId, TokenView>, AccountError> {
        let side = self.key.side_of(perspective).ok_or(AccountError::NotAParty)?;
        let mut out = BTreeMap::new();
        for (token_id, line) in &self.lines {
            let collateral = self.effective_collateral(*token_id) as i128;
            let left_credit_limit = line.left_credit_limit as i128;
            let right_credit_limit = line.right_credit_limit as i128;

            // Provisionally reserved (not yet committed) payments already
            // shrink the room for further reserves in `reserve_payment`;
            // fold the same adjustment in here so the capacity this view
            // reports — the single source of truth per-token capacity
            // checks and the router both read — matches what a further
            // reserve would actually be allowed.
            let (ltr, rtl) = self.reserved_sums(*token_id);
            let effective_delta = line.delta + ltr as i128 - rtl as i128;

            // `delta` is signed left-to-right: the left side's own credit
            // sits below zero, collateral straddles zero, and the right
            // side's credit sits above collateral. The right side reads
            // the same line from the opposite end — its own credit is the
            // region beyond collateral, collateral sits below its own
            // zero, and the left side's credit sits above it. This is the
            // mirror image of the left's layout, not a reuse of it.
            let (own_credit_seg, collateral_seg, peer_credit_seg, local_delta, local_effective_delta) =
                match side {
                    Side::Left => (
                        (-left_credit_limit, 0i128),
                        (0i128, collateral),
                        (collateral, collateral + right_credit_limit),
                        line.delta,
                        effective_delta,
                    ),
                    Side::Right => (
                        (-(collateral + right_credit_limit), -collateral),
                        (-collateral, 0i128),
                        (0i128, left_credit_limit),
                        -line.delta,
                        -effective_delta,
                    ),
                };

            let split = |seg: (i128, i128)| -> (Amount, Amount) {
                let (lo, hi) = seg;
                let clamped = local_effective_delta.clamp(lo, hi);
                let used = (clamped - lo) as u128;
                let remaining = (hi - clamped) as u128;
                (remaining, used)
            };

            let (out_own_credit, in_own_credit) = split(own_credit_seg);
            let (out_collateral, in_collateral) = split(collateral_seg);
            let (out_peer_credit, in_peer_credit) = split(peer_credit_seg);

            out.insert(
                *token_id,
                TokenView {
                    out_own_credit,
                    in_own_credit,
                    out_collateral,
                    in_collateral,
                    out_peer_credit,
                    in_peer_credit,
                    delta: local_delta,
                },
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (EntityId, EntityId) {
        (EntityId([1u8; 32]), EntityId([2u8; 32]))
    }

    fn account_with_line(collateral: u128, left_cl: u128, right_cl: u128) -> (Account, EntityId, EntityId) {
        let (a, b) = ids();
        let key = AccountKey::new(a, b);
        let mut acc = Account::new(key);
        acc.lines.insert(
            1,
            TokenLine {
                collateral,
                left_credit_limit: left_cl,
                right_credit_limit: right_cl,
                delta: 0,
                last_jurisdiction_height: 0,
            },
        );
        (acc, key.left, key.right)
    }

    // ── Scenario A: direct payment within capacity ────────────────────────
    #[test]
    fn scenario_a_direct_payment_within_capacity() {
        let (mut acc, _l, _r) = account_with_line(1000, 0, 0);
        acc.apply_payment(1, 300, Direction::LeftToRight).unwrap();
        assert_eq!(acc.lines[&1].delta, 300);
        let view = acc.derive_view(acc.key.left).unwrap();
        assert_eq!(view[&1].out_capacity(), 700);
        let view_r = acc.derive_view(acc.key.right).unwrap();
        // inCapacity(2->1): how much entity 2 (right) can still send to
        // entity 1 (left) — the right side's own out-capacity.
        assert_eq!(view_r[&1].out_capacity(), 300);
    }

    // ── Scenario B: payment exceeding capacity ────────────────────────────
    #[test]
    fn scenario_b_payment_exceeding_capacity_fails() {
        let (mut acc, _l, _r) = account_with_line(1000, 0, 0);
        let err = acc.apply_payment(1, 1500, Direction::LeftToRight).unwrap_err();
        assert!(matches!(err, AccountError::CapacityExceeded { .. }));
        assert_eq!(acc.lines[&1].delta, 0);
    }

    #[test]
    fn payment_then_negation_returns_to_prior_delta() {
        let (mut acc, _l, _r) = account_with_line(1000, 200, 200);
        acc.apply_payment(1, 300, Direction::LeftToRight).unwrap();
        let h1 = acc.height;
        acc.apply_payment(1, 300, Direction::RightToLeft).unwrap();
        assert_eq!(acc.lines[&1].delta, 0);
        assert!(acc.height > h1);
    }

    #[test]
    fn derive_view_mirrors_across_perspectives() {
        let (mut acc, l, r) = account_with_line(1000, 150, 250);
        acc.apply_payment(1, 400, Direction::LeftToRight).unwrap();
        let view_l = acc.derive_view(l).unwrap();
        let view_r = acc.derive_view(r).unwrap();
        assert_eq!(view_l[&1].out_capacity(), view_r[&1].in_capacity());
        assert_eq!(view_r[&1].out_capacity(), view_l[&1].in_capacity());
    }

    #[test]
    fn credit_limit_cannot_drop_below_utilization() {
        let (mut acc, _l, _r) = account_with_line(0, 500, 0);
        acc.apply_payment(1, 300, Direction::RightToLeft).unwrap();
        assert_eq!(acc.lines[&1].delta, -300);
        let err = acc
            .apply_credit_limit_update(Side::Left, 1, 200)
            .unwrap_err();
        assert!(matches!(err, AccountError::CreditLimitBelowUtilization { .. }));
        acc.apply_credit_limit_update(Side::Left, 1, 300).unwrap();
        assert_eq!(acc.lines[&1].left_credit_limit, 300);
    }

    #[test]
    fn settlement_rejects_non_increasing_jurisdiction_height() {
        let (mut acc, _l, _r) = account_with_line(1000, 0, 0);
        acc.apply_settlement(1, 100, 1200, 5).unwrap();
        assert_eq!(acc.lines[&1].delta, 100);
        let err = acc.apply_settlement(1, 50, 900, 5).unwrap_err();
        assert!(matches!(err, AccountError::SettlementRegressed { .. }));
        // still advances when strictly greater, even if it violates in-band capacity
        acc.apply_settlement(1, 5_000, 10, 6).unwrap();
        assert_eq!(acc.lines[&1].delta, 5_000);
    }

    #[test]
    fn reserve_reduces_effective_capacity_then_commit_applies() {
        let (mut acc, _l, _r) = account_with_line(1000, 0, 0);
        let tx1 = TxId::from_bytes([1u8; 32]);
        acc.reserve_payment(tx1, 1, 700, Direction::LeftToRight, 10)
            .unwrap();
        // a second reserve that would overflow remaining capacity fails
        let tx2 = TxId::from_bytes([2u8; 32]);
        let err = acc
            .reserve_payment(tx2, 1, 400, Direction::LeftToRight, 10)
            .unwrap_err();
        assert!(matches!(err, AccountError::CapacityExceeded { .. }));
        acc.commit_reserve(tx1).unwrap();
        assert_eq!(acc.lines[&1].delta, 700);
        assert!(acc.pending_reserves.is_empty());
    }

    #[test]
    fn expired_reserves_are_released_in_canonical_order() {
        let (mut acc, _l, _r) = account_with_line(1000, 0, 0);
        let tx1 = TxId::from_bytes([1u8; 32]);
        let tx2 = TxId::from_bytes([2u8; 32]);
        acc.reserve_payment(tx1, 1, 100, Direction::LeftToRight, 3)
            .unwrap();
        acc.reserve_payment(tx2, 1, 100, Direction::LeftToRight, 5)
            .unwrap();
        let released = acc.expire_reserves(4);
        assert_eq!(released, vec![tx1]);
        assert!(acc.pending_reserves.contains_key(&tx2));
    }

    #[test]
    fn unknown_token_rejected() {
        let (mut acc, _l, _r) = account_with_line(1000, 0, 0);
        let err = acc.apply_payment(99, 10, Direction::LeftToRight).unwrap_err();
        assert!(matches!(err, AccountError::UnknownToken(99)));
    }
}
