pub mod error;
pub mod ledger;

pub use error::AccountError;
pub use ledger::{Account, Direction, PendingReserve, TokenLine, TokenView};
