use thiserror::Error;

use xln_core::TokenId;

/// Ledger invariant and input-validation failures for account-level
/// operations (spec §4.1, §7 "Ledger invariant").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("capacity exceeded for token {token_id}: attempted delta {attempted}")]
    CapacityExceeded { token_id: TokenId, attempted: i128 },

    #[error(
        "credit limit for token {token_id} below current utilization: requested {requested}, utilization {utilization}"
    )]
    CreditLimitBelowUtilization {
        token_id: TokenId,
        requested: u128,
        utilization: u128,
    },

    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    #[error("settlement regressed for token {token_id}: jurisdiction height {attempted} <= last known {last_known}")]
    SettlementRegressed {
        token_id: TokenId,
        attempted: u64,
        last_known: u64,
    },

    #[error("entity is not a party to this account")]
    NotAParty,

    #[error("no pending reserve for tx {0}")]
    ReserveNotFound(xln_core::TxId),
}
