use thiserror::Error;

use xln_account::AccountError;
use xln_core::{EntityId, SignerId};

/// Consensus and admission failures for the entity layer (spec §4.2, §7
/// "Consensus").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("unknown counterparty account: {0}")]
    UnknownAccount(EntityId),

    #[error("transaction would not apply against current state: {0}")]
    PreflightFailed(#[from] AccountError),

    #[error("quorum not reached: {signed}/{required}")]
    QuorumNotReached { signed: usize, required: usize },

    #[error("post-state hash mismatch: proposer disagrees with re-application")]
    PostStateHashMismatch,

    #[error("proposer mismatch: expected {expected}, got {got}")]
    ProposerMismatch { expected: String, got: String },

    #[error("timed out awaiting signatures")]
    TimeoutAwaitingSignatures,

    #[error("entity is not in a state that allows this operation")]
    WrongPhase,

    #[error("signer set update requires a quorum of the current signers")]
    SignerSetUpdateNotQuorate,

    #[error("signer {0} is not a member of the current signer set")]
    UnauthorizedSigner(SignerId),
}
