use anyhow::{bail, Context};

/// Minimal JSON-RPC 2.0 client used by the wallet to talk to a running
/// node. Uses raw HTTP POST with serde_json rather than a generated
/// jsonrpsee client, keeping the wallet binary lean.
pub struct WalletRpcClient {
    url: String,
    client: reqwest::Client,
}

impl WalletRpcClient {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), client: reqwest::Client::new() }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;
        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;
        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }
        Ok(json["result"].clone())
    }

    pub async fn get_entity(&self, entity_id: &str) -> anyhow::Result<serde_json::Value> {
        self.call("xln_getEntity", serde_json::json!([entity_id])).await
    }

    pub async fn get_account_view(&self, entity_id: &str, counterparty_id: &str) -> anyhow::Result<serde_json::Value> {
        self.call("xln_getAccountView", serde_json::json!([entity_id, counterparty_id])).await
    }

    pub async fn submit_entity_tx(&self, entity_id: &str, tx_hex: &str) -> anyhow::Result<String> {
        let result = self.call("xln_submitEntityTx", serde_json::json!([entity_id, tx_hex])).await?;
        result.as_str().map(|s| s.to_string()).context("expected tx_id string from submitEntityTx")
    }

    pub async fn get_frame(&self, tick: u64) -> anyhow::Result<serde_json::Value> {
        self.call("xln_getFrame", serde_json::json!([tick])).await
    }

    pub async fn get_current_tick(&self) -> anyhow::Result<u64> {
        let result = self.call("xln_getCurrentTick", serde_json::json!([])).await?;
        result.as_u64().context("expected integer tick from getCurrentTick")
    }

    pub async fn get_version(&self) -> anyhow::Result<serde_json::Value> {
        self.call("xln_getVersion", serde_json::json!([])).await
    }
}
