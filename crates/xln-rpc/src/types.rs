use serde::{Deserialize, Serialize};

/// JSON-serializable entity summary returned by `xln_getEntity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEntity {
    pub entity_id: String,
    pub signers: Vec<String>,
    pub height: u64,
    pub phase: String,
    pub mempool_len: usize,
    pub account_counterparties: Vec<String>,
}

/// One token's named capacity regions from one perspective, returned by
/// `xln_getAccountView`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcTokenView {
    pub token_id: u64,
    pub out_own_credit: String,
    pub in_own_credit: String,
    pub out_collateral: String,
    pub in_collateral: String,
    pub out_peer_credit: String,
    pub in_peer_credit: String,
    pub delta: String,
    pub out_capacity: String,
    pub in_capacity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcAccountView {
    pub entity_id: String,
    pub counterparty_id: String,
    pub tokens: Vec<RpcTokenView>,
}

/// JSON-serializable committed server frame returned by `xln_getFrame`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcFrame {
    pub tick: u64,
    pub applied_count: usize,
    pub rejected_count: usize,
    pub state_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcVersionInfo {
    pub node_version: String,
    pub protocol_version: String,
    pub api_version: String,
}
