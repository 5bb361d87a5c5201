use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use xln_core::EntityId;
use xln_entity::EntityTx;
use xln_replay::{ServerInput, ServerInputOutcome};
use xln_state::StateDb;

use crate::api::XlnApiServer;
use crate::types::{RpcAccountView, RpcEntity, RpcFrame, RpcTokenView, RpcVersionInfo};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn parse_entity_id(s: &str) -> RpcResult<EntityId> {
    EntityId::from_b58(s).map_err(|e| rpc_err(-32602, format!("invalid entity id: {e}")))
}

/// Shared state passed to the RPC server: a read handle on persisted
/// state and a write handle into the tick loop's ingress queue.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    pub ingress: mpsc::Sender<ServerInput>,
}

pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl XlnApiServer for RpcServer {
    async fn get_entity(&self, entity_id: String) -> RpcResult<Option<RpcEntity>> {
        let id = parse_entity_id(&entity_id)?;
        let entity = self
            .state
            .db
            .get_entity(&id)
            .map_err(|e| rpc_err(-32000, e.to_string()))?;
        Ok(entity.map(|e| RpcEntity {
            entity_id: e.id.to_b58(),
            signers: e.signers.iter().map(|s| s.to_b58()).collect(),
            height: e.height,
            phase: format!("{:?}", e.phase),
            mempool_len: e.mempool.len(),
            account_counterparties: e.accounts.keys().map(|c| c.to_b58()).collect(),
        }))
    }

    async fn get_account_view(
        &self,
        entity_id: String,
        counterparty_id: String,
    ) -> RpcResult<Option<RpcAccountView>> {
        let id = parse_entity_id(&entity_id)?;
        let counterparty = parse_entity_id(&counterparty_id)?;
        let Some(entity) = self.state.db.get_entity(&id).map_err(|e| rpc_err(-32000, e.to_string()))? else {
            return Ok(None);
        };
        let Some(account) = entity.accounts.get(&counterparty) else {
            return Ok(None);
        };
        let view = account
            .derive_view(id)
            .map_err(|e| rpc_err(-32001, e.to_string()))?;
        let tokens = view
            .into_iter()
            .map(|(token_id, v)| RpcTokenView {
                token_id,
                out_own_credit: v.out_own_credit.to_string(),
                in_own_credit: v.in_own_credit.to_string(),
                out_collateral: v.out_collateral.to_string(),
                in_collateral: v.in_collateral.to_string(),
                out_peer_credit: v.out_peer_credit.to_string(),
                in_peer_credit: v.in_peer_credit.to_string(),
                delta: v.delta.to_string(),
                out_capacity: v.out_capacity().to_string(),
                in_capacity: v.in_capacity().to_string(),
            })
            .collect();
        Ok(Some(RpcAccountView { entity_id, counterparty_id, tokens }))
    }

    async fn submit_entity_tx(&self, entity_id: String, tx_hex: String) -> RpcResult<String> {
        let id = parse_entity_id(&entity_id)?;
        let bytes = hex::decode(&tx_hex).map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;
        let tx: EntityTx =
            bincode::deserialize(&bytes).map_err(|e| rpc_err(-32602, format!("invalid EntityTx: {e}")))?;
        let tx_id = xln_crypto::hash::tx_id_from_body(&bytes);
        self.state
            .ingress
            .send(ServerInput::SubmitEntityTx { entity_id: id, tx })
            .await
            .map_err(|_| rpc_err(-32003, "ingress channel closed"))?;
        Ok(tx_id.to_hex())
    }

    async fn get_frame(&self, tick: u64) -> RpcResult<Option<RpcFrame>> {
        let frame = self.state.db.get_frame(tick).map_err(|e| rpc_err(-32000, e.to_string()))?;
        Ok(frame.map(|f| {
            let applied = f
                .records
                .iter()
                .filter(|r| matches!(r.outcome, ServerInputOutcome::Applied))
                .count();
            RpcFrame {
                tick: f.tick,
                applied_count: applied,
                rejected_count: f.records.len() - applied,
                state_hash: f.state_hash.to_hex(),
            }
        }))
    }

    async fn get_current_tick(&self) -> RpcResult<u64> {
        Ok(self
            .state
            .db
            .latest_frame_tick()
            .map_err(|e| rpc_err(-32000, e.to_string()))?
            .unwrap_or(0))
    }

    async fn get_version(&self) -> RpcResult<RpcVersionInfo> {
        Ok(RpcVersionInfo {
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: "xln/1".to_string(),
            api_version: "1".to_string(),
        })
    }
}
