pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{Config, ProposerRule, QuorumRule};
pub use constants::*;
pub use error::CoreError;
pub use types::*;
