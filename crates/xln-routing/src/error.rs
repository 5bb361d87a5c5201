use thiserror::Error;

/// Failure taxonomy for the multi-hop payment protocol (spec §4.4, §7
/// "Routing").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("no route found within the configured hop bound")]
    NoRoute,

    #[error("insufficient capacity at hop {hop_index}")]
    InsufficientCapacity { hop_index: usize },

    #[error("reserve expired before the receiver acknowledged")]
    ReserveTimeout,

    #[error("counterparty unavailable at hop {hop_index}")]
    CounterpartyUnavailable { hop_index: usize },

    #[error("token mismatch along route")]
    TokenMismatch,
}
