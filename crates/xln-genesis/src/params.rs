use serde::{Deserialize, Serialize};

use xln_core::{Amount, Config, EntityId, SignerId, TokenId};

/// A seed account between two genesis entities: funded with collateral
/// and credit limits directly, bypassing consensus the way a founding
/// document precedes any transaction (spec §4.1 "Account", §9 genesis).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisAccountSpec {
    pub counterparty: EntityId,
    pub token_id: TokenId,
    pub collateral: Amount,
    pub left_credit_limit: Amount,
    pub right_credit_limit: Amount,
}

/// One entity's founding configuration: identity, signer quorum, and the
/// bilateral accounts it opens at genesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisEntitySpec {
    pub id: EntityId,
    pub signers: Vec<SignerId>,
    pub config: Config,
    pub accounts: Vec<GenesisAccountSpec>,
}

/// The complete founding document for a fresh deployment. All IDs,
/// signer sets, and seed credit lines are supplied by the caller — genesis
/// mints nothing here, it only establishes who the initial entities are
/// and what bilateral capacity they start with.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisParams {
    pub entities: Vec<GenesisEntitySpec>,
}
