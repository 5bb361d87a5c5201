use thiserror::Error;

use xln_account::AccountError;
use xln_state::StateDbError;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Storage(#[from] StateDbError),

    #[error("duplicate genesis entity id")]
    DuplicateEntity,
}
