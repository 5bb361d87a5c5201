use thiserror::Error;

use xln_core::CoreError;
use xln_state::StateDbError;

/// Failure taxonomy for the server tick loop and ingress path (spec §4.3,
/// §7 "Server errors").
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StateDbError),
}
