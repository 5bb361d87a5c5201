use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcAccountView, RpcEntity, RpcFrame, RpcVersionInfo};

/// XLN JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "xln_" via `namespace = "xln"`.
#[rpc(server, namespace = "xln")]
pub trait XlnApi {
    /// Get an entity's replica summary by base-58 entity ID.
    #[method(name = "getEntity")]
    async fn get_entity(&self, entity_id: String) -> RpcResult<Option<RpcEntity>>;

    /// Get the seven-region capacity view of the account between
    /// `entity_id` and `counterparty_id`, from `entity_id`'s perspective.
    #[method(name = "getAccountView")]
    async fn get_account_view(
        &self,
        entity_id: String,
        counterparty_id: String,
    ) -> RpcResult<Option<RpcAccountView>>;

    /// Submit a hex-encoded bincode(EntityTx) into `entity_id`'s mempool.
    /// Returns the computed TxId hex on successful enqueue.
    #[method(name = "submitEntityTx")]
    async fn submit_entity_tx(&self, entity_id: String, tx_hex: String) -> RpcResult<String>;

    /// Get a committed server frame by tick.
    #[method(name = "getFrame")]
    async fn get_frame(&self, tick: u64) -> RpcResult<Option<RpcFrame>>;

    /// Get the latest committed tick.
    #[method(name = "getCurrentTick")]
    async fn get_current_tick(&self) -> RpcResult<u64>;

    /// Return node and protocol version information.
    #[method(name = "getVersion")]
    async fn get_version(&self) -> RpcResult<RpcVersionInfo>;
}
