use serde::{Deserialize, Serialize};

use xln_account::Direction;
use xln_core::{Amount, EntityId, JurisdictionHeight, Side, TokenId, TxId};

/// A bilateral ledger operation, addressed to one specific counterparty
/// account (spec §6 "AccountTx variants").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountTx {
    Payment {
        token_id: TokenId,
        amount: Amount,
        direction: Direction,
    },
    CreditLimit {
        side: Side,
        token_id: TokenId,
        new_limit: Amount,
    },
    Settlement {
        token_id: TokenId,
        resulting_delta: i128,
        new_collateral: Amount,
        jurisdiction_height: JurisdictionHeight,
    },
    /// Reserve-phase hold for one hop of a multi-hop payment (spec §4.4
    /// "Reserve"). Does not move `delta` until `CommitReserve` lands.
    ReservePayment {
        payment_id: TxId,
        token_id: TokenId,
        amount: Amount,
        direction: Direction,
        expires_at_tick: u64,
    },
    /// Commit-phase application of a previously reserved hop.
    CommitReserve { payment_id: TxId },
    /// Release a reserve without applying it (failure or timeout path).
    ReleaseReserve { payment_id: TxId },
}

/// A transaction submitted into an entity's mempool (spec §6 "EntityTx
/// variants"). Tagged variants replace the source's dynamically-typed
/// ingress payloads (spec §9).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityTx {
    /// Initiate a multi-hop payment; expanded by the routing layer into a
    /// sequence of per-hop `AccountInput` transactions.
    DirectPayment {
        target_entity_id: EntityId,
        token_id: TokenId,
        amount: Amount,
        route: Vec<EntityId>,
        description: Option<String>,
    },
    /// Apply an `AccountTx` against one specific counterparty's ledger
    /// replica.
    AccountInput {
        from_entity_id: EntityId,
        to_entity_id: EntityId,
        account_tx: AccountTx,
        metadata: Option<String>,
    },
    /// Informational only; not consensus-critical in the sense that it
    /// never touches an account's capacity invariant, but still ordered
    /// and committed through a frame like any other transaction.
    ProfileUpdate { display_name: Option<String>, metadata: Option<String> },

    /// Mutate the entity's signer set. Admitted only when signed by a
    /// quorum of the *current* signer set (spec §9 open question).
    UpdateSignerSet { new_signers: Vec<xln_core::SignerId> },
}
