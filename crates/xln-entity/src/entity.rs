use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use xln_account::Account;
use xln_core::{AccountKey, Amount, Config, EntityId, Height, ProposerRule, QuorumRule, SignerId, StateHash, TokenId, TxId};
use xln_crypto::hash::state_hash;

use crate::error::EntityError;
use crate::frame::{CandidateFrame, ConsensusPhase, Frame, Narrative, TxOutcome};
use crate::tx::{AccountTx, EntityTx};

/// Canonical, hashable view of an entity's applied state, used both to
/// compute `post_state_hash` and as the basis for replay snapshots.
/// `BTreeMap` iteration is already key-ascending, satisfying the
/// canonical-ordering requirement (spec §4.1, §4.5).
#[derive(Serialize)]
struct StateSnapshotView<'a> {
    entity_id: EntityId,
    height: Height,
    reserves: &'a BTreeMap<TokenId, Amount>,
    accounts: &'a BTreeMap<EntityId, Account>,
    parent_hash: StateHash,
    applied_txs: &'a [(TxId, EntityTx, TxOutcome)],
}

/// A replicated entity: its signer set, consensus phase, mempool, token
/// reserves, and the map of bilateral account replicas it owns (spec §3
/// "Entity", §4.2).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub signers: Vec<SignerId>,
    pub config: Config,
    pub height: Height,
    pub reserves: BTreeMap<TokenId, Amount>,
    pub accounts: BTreeMap<EntityId, Account>,
    pub mempool: Vec<(TxId, EntityTx)>,
    pub phase: ConsensusPhase,
    pub last_frame_hash: StateHash,
    pub profile: BTreeMap<String, String>,
    #[serde(skip)]
    pub candidate: Option<CandidateFrame>,
}

impl Entity {
    pub fn new(id: EntityId, mut signers: Vec<SignerId>, config: Config) -> Self {
        signers.sort();
        signers.dedup();
        Entity {
            id,
            signers,
            config,
            height: 0,
            reserves: BTreeMap::new(),
            accounts: BTreeMap::new(),
            mempool: Vec::new(),
            phase: ConsensusPhase::Idle,
            last_frame_hash: StateHash::zero(),
            profile: BTreeMap::new(),
            candidate: None,
        }
    }

    /// Deterministic proposer selection for `height` (spec §4.2 "Proposer
    /// rule").
    pub fn proposer_for_height(&self, height: Height) -> Option<SignerId> {
        if self.signers.is_empty() {
            return None;
        }
        match &self.config.proposer_rule {
            ProposerRule::RoundRobin => {
                let idx = (height as usize) % self.signers.len();
                Some(self.signers[idx])
            }
            ProposerRule::Fixed(signer) => Some(*signer),
        }
    }

    /// Number of signatures required to reach quorum (spec §4.2
    /// "Quorum").
    pub fn quorum_required(&self) -> usize {
        let n = self.signers.len();
        match &self.config.quorum_rule {
            QuorumRule::Majority => n / 2 + 1,
            QuorumRule::Threshold { n: need, .. } => *need as usize,
            QuorumRule::All => n,
        }
    }

    fn counterparty_of(&self, from: EntityId, to: EntityId) -> Result<EntityId, EntityError> {
        if from == self.id {
            Ok(to)
        } else if to == self.id {
            Ok(from)
        } else {
            Err(EntityError::UnknownAccount(to))
        }
    }

    /// Apply one `EntityTx` against `accounts`/`reserves`/`profile`,
    /// whichever scratch or live maps are passed in. Shared by preflight
    /// and commit so both paths exercise identical logic (spec §4.2
    /// "Transaction admission").
    fn apply_one(
        &self,
        accounts: &mut BTreeMap<EntityId, Account>,
        profile: &mut BTreeMap<String, String>,
        tx: &EntityTx,
    ) -> Result<(), EntityError> {
        match tx {
            EntityTx::AccountInput {
                from_entity_id,
                to_entity_id,
                account_tx,
                ..
            } => {
                let counterparty = self.counterparty_of(*from_entity_id, *to_entity_id)?;
                let key = AccountKey::new(self.id, counterparty);
                let account = accounts
                    .entry(counterparty)
                    .or_insert_with(|| Account::new(key));
                match account_tx {
                    AccountTx::Payment {
                        token_id,
                        amount,
                        direction,
                    } => account.apply_payment(*token_id, *amount, *direction)?,
                    AccountTx::CreditLimit {
                        side,
                        token_id,
                        new_limit,
                    } => account.apply_credit_limit_update(*side, *token_id, *new_limit)?,
                    AccountTx::Settlement {
                        token_id,
                        resulting_delta,
                        new_collateral,
                        jurisdiction_height,
                    } => account.apply_settlement(
                        *token_id,
                        *resulting_delta,
                        *new_collateral,
                        *jurisdiction_height,
                    )?,
                    AccountTx::ReservePayment {
                        payment_id,
                        token_id,
                        amount,
                        direction,
                        expires_at_tick,
                    } => account.reserve_payment(*payment_id, *token_id, *amount, *direction, *expires_at_tick)?,
                    AccountTx::CommitReserve { payment_id } => account.commit_reserve(*payment_id)?,
                    AccountTx::ReleaseReserve { payment_id } => {
                        account.release_reserve(*payment_id);
                    }
                }
                Ok(())
            }
            EntityTx::ProfileUpdate {
                display_name,
                metadata,
            } => {
                if let Some(name) = display_name {
                    profile.insert("display_name".into(), name.clone());
                }
                if let Some(meta) = metadata {
                    profile.insert("metadata".into(), meta.clone());
                }
                Ok(())
            }
            EntityTx::DirectPayment { route, .. } => {
                // Entity-local application is a no-op marker: the routing
                // layer expands a DirectPayment into per-hop AccountInput
                // transactions submitted to each hop's mempool. Here we
                // only validate the route starts at this entity.
                if route.first() != Some(&self.id) {
                    return Err(EntityError::UnknownAccount(self.id));
                }
                Ok(())
            }
            EntityTx::UpdateSignerSet { new_signers } => {
                if new_signers.is_empty() {
                    return Err(EntityError::SignerSetUpdateNotQuorate);
                }
                Ok(())
            }
        }
    }

    /// Syntactic + preflight validation: confirms `tx` would apply
    /// against current state without mutating it (spec §4.2 "Transaction
    /// admission").
    pub fn preflight(&self, tx: &EntityTx) -> Result<(), EntityError> {
        let mut scratch_accounts = self.accounts.clone();
        let mut scratch_profile = self.profile.clone();
        self.apply_one(&mut scratch_accounts, &mut scratch_profile, tx)
    }

    /// Admit `tx` to the mempool after syntactic validation and preflight.
    /// The `TxId` is the hash of the tx's canonical bytes, so resubmitting
    /// byte-identical content is naturally idempotent.
    pub fn submit_tx(&mut self, tx: EntityTx) -> Result<TxId, EntityError> {
        self.preflight(&tx)?;
        let bytes = bincode::serialize(&tx).expect("EntityTx serialization is infallible");
        let tx_id = xln_crypto::hash::tx_id_from_body(&bytes);
        if !self.mempool.iter().any(|(id, _)| *id == tx_id) {
            self.mempool.push((tx_id, tx));
        }
        Ok(tx_id)
    }

    /// `Idle -> Proposing -> AwaitingSignatures`: build a candidate frame
    /// from the current mempool, applied in submission order (spec §4.2).
    pub fn propose(&mut self, now_tick: u64) -> Result<(), EntityError> {
        if self.phase != ConsensusPhase::Idle {
            return Err(EntityError::WrongPhase);
        }
        if self.mempool.is_empty() {
            return Ok(());
        }
        self.phase = ConsensusPhase::Proposing;

        let height = self.height + 1;
        let proposer = self
            .proposer_for_height(height)
            .ok_or(EntityError::WrongPhase)?;

        let mut scratch_accounts = self.accounts.clone();
        let mut scratch_profile = self.profile.clone();
        let mut applied = Vec::with_capacity(self.mempool.len());
        for (tx_id, tx) in &self.mempool {
            match self.apply_one(&mut scratch_accounts, &mut scratch_profile, tx) {
                Ok(()) => applied.push((*tx_id, tx.clone(), TxOutcome::Applied)),
                Err(e) => {
                    debug!(tx_id = %tx_id, error = %e, "transaction failed during proposal");
                    applied.push((*tx_id, tx.clone(), TxOutcome::Failed { reason: e.to_string() }));
                }
            }
        }

        let snapshot = StateSnapshotView {
            entity_id: self.id,
            height,
            reserves: &self.reserves,
            accounts: &scratch_accounts,
            parent_hash: self.last_frame_hash,
            applied_txs: &applied,
        };
        let bytes = bincode::serialize(&snapshot).expect("snapshot serialization is infallible");
        let post_state_hash = state_hash(&bytes);

        let frame = Frame {
            parent_hash: self.last_frame_hash,
            height,
            proposer,
            signatures: BTreeMap::new(),
            txs: applied,
            post_state_hash,
            narrative: Narrative::default(),
        };
        self.candidate = Some(CandidateFrame {
            frame,
            proposed_at_tick: now_tick,
        });
        self.phase = ConsensusPhase::AwaitingSignatures;
        Ok(())
    }

    /// Record a signer's signature over the candidate frame. Returns the
    /// committed `Frame` once quorum is reached.
    pub fn receive_signature(
        &mut self,
        signer: SignerId,
        signature: Vec<u8>,
    ) -> Result<Option<Frame>, EntityError> {
        if self.phase != ConsensusPhase::AwaitingSignatures {
            return Err(EntityError::WrongPhase);
        }
        if !self.signers.contains(&signer) {
            return Err(EntityError::UnauthorizedSigner(signer));
        }
        let candidate = self.candidate.as_mut().ok_or(EntityError::WrongPhase)?;
        candidate.frame.signatures.insert(signer, signature);

        if candidate.frame.signatures.len() >= self.quorum_required() {
            Ok(Some(self.commit_candidate()?))
        } else {
            Ok(None)
        }
    }

    /// `AwaitingSignatures -> Committed -> Idle`: apply the candidate
    /// frame's transactions to live state and append it to history.
    fn commit_candidate(&mut self) -> Result<Frame, EntityError> {
        let candidate = self.candidate.take().ok_or(EntityError::WrongPhase)?;
        self.phase = ConsensusPhase::Committed;

        let included: std::collections::HashSet<TxId> =
            candidate.frame.txs.iter().map(|(id, _, _)| *id).collect();
        for (tx_id, tx, outcome) in &candidate.frame.txs {
            if matches!(outcome, TxOutcome::Applied) {
                // Infallible: preflight + proposal already proved this tx
                // applies against the same prior state.
                self.apply_one_live(tx);
            }
            debug!(tx_id = %tx_id, "committed");
        }
        self.mempool.retain(|(id, _)| !included.contains(id));

        self.height = candidate.frame.height;
        self.last_frame_hash = candidate.frame.post_state_hash;
        info!(entity = %self.id, height = self.height, "frame committed");
        self.phase = ConsensusPhase::Idle;
        Ok(candidate.frame)
    }

    fn apply_one_live(&mut self, tx: &EntityTx) {
        let mut accounts = std::mem::take(&mut self.accounts);
        let mut profile = std::mem::take(&mut self.profile);
        let _ = self.apply_one(&mut accounts, &mut profile, tx);
        self.accounts = accounts;
        self.profile = profile;
    }

    /// `AwaitingSignatures -> Aborted -> Idle`: discard the candidate
    /// frame; the mempool (never drained until commit) is already
    /// effectively restored.
    pub fn abort(&mut self, reason: &EntityError) {
        warn!(entity = %self.id, error = %reason, "frame aborted");
        self.candidate = None;
        self.phase = ConsensusPhase::Aborted;
        self.phase = ConsensusPhase::Idle;
    }

    /// Abort the in-flight candidate if it has been `AwaitingSignatures`
    /// for longer than `timeout_ticks` (spec §4.2 "AwaitingSignatures ->
    /// Aborted on timeout").
    pub fn check_timeout(&mut self, now_tick: u64, timeout_ticks: u64) -> bool {
        if let Some(candidate) = &self.candidate {
            if now_tick.saturating_sub(candidate.proposed_at_tick) > timeout_ticks {
                self.abort(&EntityError::TimeoutAwaitingSignatures);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_account::Direction;
    use xln_core::Side;

    fn two_signer_entity(id: EntityId) -> Entity {
        let signers = vec![SignerId([1u8; 32]), SignerId([2u8; 32])];
        Entity::new(id, signers, Config::default())
    }

    #[test]
    fn round_robin_proposer_cycles_deterministically() {
        let e = two_signer_entity(EntityId([9u8; 32]));
        assert_eq!(e.proposer_for_height(0), Some(SignerId([1u8; 32])));
        assert_eq!(e.proposer_for_height(1), Some(SignerId([2u8; 32])));
        assert_eq!(e.proposer_for_height(2), Some(SignerId([1u8; 32])));
    }

    #[test]
    fn majority_quorum_of_two_requires_both() {
        let e = two_signer_entity(EntityId([9u8; 32]));
        assert_eq!(e.quorum_required(), 2);
    }

    #[test]
    fn propose_and_commit_applies_payment() {
        let me = EntityId([1u8; 32]);
        let peer = EntityId([2u8; 32]);
        let mut entity = two_signer_entity(me);

        // Establish a token line with enough room on the right side for
        // the payment below to actually fit within capacity.
        entity
            .submit_tx(EntityTx::AccountInput {
                from_entity_id: me,
                to_entity_id: peer,
                account_tx: AccountTx::CreditLimit {
                    side: Side::Right,
                    token_id: 1,
                    new_limit: 1000,
                },
                metadata: None,
            })
            .unwrap();
        entity.propose(0).unwrap();
        let sigs: Vec<SignerId> = entity.signers.clone();
        let mut last = None;
        for s in sigs {
            last = entity.receive_signature(s, vec![0u8]).unwrap();
        }
        assert!(last.is_some());
        assert_eq!(entity.height, 1);
        assert_eq!(entity.phase, ConsensusPhase::Idle);

        entity
            .submit_tx(EntityTx::AccountInput {
                from_entity_id: me,
                to_entity_id: peer,
                account_tx: AccountTx::Payment {
                    token_id: 1,
                    amount: 50,
                    direction: Direction::LeftToRight,
                },
                metadata: None,
            })
            .unwrap();
        entity.propose(1).unwrap();
        for s in entity.signers.clone() {
            entity.receive_signature(s, vec![0u8]).unwrap();
        }
        assert_eq!(entity.height, 2);
        let view = entity.accounts[&peer].derive_view(me).unwrap();
        // `me` is the lexicographically smaller id, so it's the account's
        // left side: `local_delta == line.delta` directly, unnegated.
        assert_eq!(view[&1].delta, 50);
    }

    #[test]
    fn timeout_aborts_and_restores_mempool() {
        let me = EntityId([1u8; 32]);
        let peer = EntityId([2u8; 32]);
        let mut entity = two_signer_entity(me);
        entity
            .submit_tx(EntityTx::ProfileUpdate {
                display_name: Some("alice".into()),
                metadata: None,
            })
            .unwrap();
        let _ = peer; // silence unused in this scenario
        entity.propose(0).unwrap();
        assert_eq!(entity.phase, ConsensusPhase::AwaitingSignatures);
        let timed_out = entity.check_timeout(100, 10);
        assert!(timed_out);
        assert_eq!(entity.phase, ConsensusPhase::Idle);
        assert_eq!(entity.mempool.len(), 1);
    }
}
