pub mod error;
pub mod pathfind;
pub mod payment;

pub use error::RoutingError;
pub use pathfind::{find_route, CapacityView, HopCountCost, RouteCost};
pub use payment::{
    commit_hop, commit_hop_tx, direction_for_hop, release_hop, release_hop_tx, reserve_hop, reserve_hop_tx,
    HopStatus, MultiHopPayment,
};
