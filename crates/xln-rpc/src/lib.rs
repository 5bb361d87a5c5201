//! JSON-RPC 2.0 surface over a running node: read access to committed
//! entity/account/frame state plus a single write path for submitting
//! entity transactions into the ingress queue (spec §10 "RPC").
//!
//! Observer-event subscriptions (pubsub over the `ObserverEvent` stream
//! `xln-server` broadcasts) are intentionally not wired here yet; callers
//! poll `getFrame`/`getCurrentTick` instead. See DESIGN.md.

pub mod api;
pub mod server;
pub mod types;

pub use api::XlnApiServer;
pub use server::{RpcServer, RpcServerState};
pub use types::{RpcAccountView, RpcEntity, RpcFrame, RpcTokenView, RpcVersionInfo};
