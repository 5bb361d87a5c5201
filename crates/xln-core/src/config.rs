use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DEDUP_WINDOW_TICKS, DEFAULT_INGRESS_QUEUE_BOUND, DEFAULT_MAX_HOPS,
    DEFAULT_RESERVE_TIMEOUT_TICKS, DEFAULT_SNAPSHOT_INTERVAL_FRAMES, DEFAULT_TOKEN_DECIMALS,
};
use crate::types::SignerId;

/// Quorum predicate an entity's consensus engine evaluates against its
/// signer set before a candidate frame may commit. Pluggable per spec
/// §4.2; the engine only requires that evaluation be deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuorumRule {
    /// Strictly more than half of the signer set must sign.
    Majority,
    /// At least `n` of the `m` current signers must sign.
    Threshold { n: u32, m: u32 },
    /// Every current signer must sign.
    All,
}

impl Default for QuorumRule {
    fn default() -> Self {
        QuorumRule::Majority
    }
}

/// Deterministic function selecting the proposer for a given frame height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposerRule {
    /// `signers[height % signers.len()]`, signers sorted canonically.
    RoundRobin,
    /// Always the same fixed signer.
    Fixed(SignerId),
}

impl Default for ProposerRule {
    fn default() -> Self {
        ProposerRule::RoundRobin
    }
}

/// Recognized runtime configuration (spec §6 "Configuration").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub quorum_rule: QuorumRule,
    pub proposer_rule: ProposerRule,
    pub max_hops: u8,
    pub reserve_timeout_ticks: u64,
    pub token_decimals: u8,
    pub ingress_queue_bound: usize,
    pub snapshot_interval_frames: u64,
    pub dedup_window_ticks: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quorum_rule: QuorumRule::default(),
            proposer_rule: ProposerRule::default(),
            max_hops: DEFAULT_MAX_HOPS,
            reserve_timeout_ticks: DEFAULT_RESERVE_TIMEOUT_TICKS,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            ingress_queue_bound: DEFAULT_INGRESS_QUEUE_BOUND,
            snapshot_interval_frames: DEFAULT_SNAPSHOT_INTERVAL_FRAMES,
            dedup_window_ticks: DEFAULT_DEDUP_WINDOW_TICKS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.max_hops, 3);
        assert_eq!(cfg.reserve_timeout_ticks, 10);
        assert_eq!(cfg.token_decimals, 18);
        assert_eq!(cfg.quorum_rule, QuorumRule::Majority);
        assert_eq!(cfg.proposer_rule, ProposerRule::RoundRobin);
    }
}
