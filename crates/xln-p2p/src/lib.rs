//! Gossip transport between nodes hosting the same or related entities:
//! entity transaction submission, signature shares, and frame sync
//! announcements, carried over libp2p gossipsub (spec §10 "P2P").

pub mod config;
pub mod message;
pub mod network;

pub use config::P2pConfig;
pub use message::P2pMessage;
pub use network::{P2pHandle, P2pNetwork, XlnBehaviour, XlnBehaviourEvent};
