pub mod cursor;
pub mod error;
pub mod frame;
pub mod history;
pub mod reducer;
pub mod state;

pub use cursor::{replay_to, Cursor};
pub use error::ReplayError;
pub use frame::{ServerFrame, ServerInputRecord};
pub use history::History;
pub use reducer::reduce;
pub use state::{ReplayState, ServerInput, ServerInputOutcome};
