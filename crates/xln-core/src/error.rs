use thiserror::Error;

/// Shared error taxonomy reused across the workspace. Layer-specific crates
/// (`xln-account`, `xln-entity`, `xln-routing`, `xln-replay`) define their
/// own enums for failures specific to that layer and wrap `CoreError` via
/// `#[from]` where a shared variant applies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ── Input validation ──────────────────────────────────────────────────
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("unauthorized signer: {0}")]
    UnauthorizedSigner(String),

    #[error("unknown token: {0}")]
    UnknownToken(u64),

    #[error("malformed transaction: {0}")]
    MalformedTx(String),

    #[error("ingress queue full")]
    QueueFull,

    #[error("duplicate input")]
    DuplicateInput,

    // ── General ───────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}
