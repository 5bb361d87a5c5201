pub mod entity;
pub mod error;
pub mod frame;
pub mod tx;

pub use entity::Entity;
pub use error::EntityError;
pub use frame::{CandidateFrame, ConsensusPhase, Frame, Narrative, TxOutcome};
pub use tx::{AccountTx, EntityTx};
