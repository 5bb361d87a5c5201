use thiserror::Error;

/// Failure taxonomy for the persistence layer (spec §4.5 "Persistence").
#[derive(Debug, Error)]
pub enum StateDbError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
