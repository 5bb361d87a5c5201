//! End-to-end smoke test for xln-node.
//!
//! Starts a real node process with a fresh genesis, submits an entity
//! transaction via JSON-RPC, and asserts the bilateral account view is
//! correctly reflected once the devnet auto-consensus driver commits it.
//!
//! Run with:
//!   cargo test -p xln-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use xln_account::Direction;
use xln_core::{Config, EntityId, SignerId};
use xln_entity::{AccountTx, EntityTx};
use xln_genesis::{GenesisAccountSpec, GenesisEntitySpec, GenesisParams};

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let body = serde_json::json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });
    let resp = client.post(url).json(&body).send().await.unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({ "jsonrpc": "2.0", "method": "xln_getVersion", "params": [], "id": 1 });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    false
}

#[tokio::test]
async fn smoke_submit_payment_and_observe_account_view() {
    let data_dir = std::env::temp_dir().join(format!("xln_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let alice = EntityId([11u8; 32]);
    let bob = EntityId([22u8; 32]);
    let signer_a = SignerId([1u8; 32]);
    let signer_b = SignerId([2u8; 32]);

    let params = GenesisParams {
        entities: vec![
            GenesisEntitySpec {
                id: alice,
                signers: vec![signer_a],
                config: Config::default(),
                accounts: vec![GenesisAccountSpec {
                    counterparty: bob,
                    token_id: 1,
                    collateral: 1_000_000,
                    left_credit_limit: 0,
                    right_credit_limit: 0,
                }],
            },
            GenesisEntitySpec {
                id: bob,
                signers: vec![signer_b],
                config: Config::default(),
                accounts: vec![GenesisAccountSpec {
                    counterparty: alice,
                    token_id: 1,
                    collateral: 1_000_000,
                    left_credit_limit: 0,
                    right_credit_limit: 0,
                }],
            },
        ],
    };
    let params_path = data_dir.join("genesis-params.json");
    std::fs::write(&params_path, serde_json::to_string(&params).unwrap()).unwrap();

    let rpc_port = free_port();
    let p2p_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);

    let node_bin = env!("CARGO_BIN_EXE_xln-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",
            data_dir.join("state").to_str().unwrap(),
            "--rpc-addr",
            &format!("127.0.0.1:{}", rpc_port),
            "--p2p-listen",
            &format!("/ip4/127.0.0.1/tcp/{}", p2p_port),
            "--genesis-params",
            params_path.to_str().unwrap(),
            "--tick-interval-ms",
            "50",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn xln-node");

    let _guard = NodeGuard { child, data_dir };

    let http = reqwest::Client::new();
    assert!(wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await, "xln-node did not become ready within 20 seconds");

    let alice_b58 = alice.to_b58();
    let bob_b58 = bob.to_b58();

    let entity = rpc_call(&http, &rpc_url, "xln_getEntity", serde_json::json!([alice_b58])).await;
    assert!(!entity.is_null(), "alice should exist after genesis");

    let tx = EntityTx::AccountInput {
        from_entity_id: alice,
        to_entity_id: bob,
        account_tx: AccountTx::Payment { token_id: 1, amount: 300, direction: Direction::LeftToRight },
        metadata: None,
    };
    let bytes = bincode::serialize(&tx).unwrap();
    let tx_hex = hex::encode(bytes);

    rpc_call(&http, &rpc_url, "xln_submitEntityTx", serde_json::json!([alice_b58.clone(), tx_hex])).await;

    // Allow a few tick intervals for submit -> propose -> sign -> commit.
    tokio::time::sleep(Duration::from_millis(600)).await;

    let view = rpc_call(&http, &rpc_url, "xln_getAccountView", serde_json::json!([alice_b58, bob_b58])).await;
    assert!(!view.is_null(), "account view should exist after the payment commits");
    let tokens = view["tokens"].as_array().expect("tokens array");
    let token = tokens.iter().find(|t| t["token_id"] == 1).expect("token 1 present");
    assert_eq!(token["delta"], "300", "alice (left) paying bob (right) moves delta positive by the payment amount");
}
