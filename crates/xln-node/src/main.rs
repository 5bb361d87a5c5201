//! xln-node — the XLN full-node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the P2P network (libp2p GossipSub + Kademlia)
//!   4. Start the JSON-RPC 2.0 server
//!   5. Run the tick loop: drain ingress → reduce → persist → gossip

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use xln_core::{DEFAULT_INGRESS_QUEUE_BOUND, DEFAULT_RESERVE_TIMEOUT_TICKS};
use xln_genesis::{apply_genesis, GenesisParams};
use xln_p2p::{P2pConfig, P2pMessage, P2pNetwork};
use xln_replay::{ServerInput, ServerInputOutcome};
use xln_rpc::{RpcServer, RpcServerState};
use xln_server::Server;
use xln_state::StateDb;

#[derive(Parser, Debug)]
#[command(name = "xln-node", version, about = "XLN full node — bilateral payment-channel network")]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.xln/data")]
    data_dir: PathBuf,

    /// P2P listen address.
    #[arg(long, default_value = "/ip4/0.0.0.0/tcp/7777")]
    p2p_listen: String,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Bootstrap peer multiaddresses (comma-separated).
    #[arg(long, value_delimiter = ',')]
    bootstrap: Vec<String>,

    /// Path to genesis params JSON. Required on first run against a fresh
    /// data directory; ignored once the database already has entities.
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Tick loop cadence in milliseconds.
    #[arg(long, default_value_t = 100)]
    tick_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,xln=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("xln node starting");

    // ── State database ──────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir).with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ─────────────────────────────────────────────────
    let genesis_state = if db.count_entities().unwrap_or(0) == 0 {
        info!("fresh database — applying genesis");
        let params = load_genesis_params(args.genesis_params.as_deref())?;
        apply_genesis(&db, &params).context("applying genesis")?
    } else {
        info!("existing database found — loading persisted state");
        db.load_replay_state().context("loading persisted state")?
    };

    let mut server = Server::new(genesis_state, Some(Arc::clone(&db)));
    let ingress = server.ingress_handle();

    // ── P2P network ──────────────────────────────────────────────────────
    let p2p_config = P2pConfig { listen_addr: args.p2p_listen.clone(), bootstrap_peers: args.bootstrap.clone(), ..P2pConfig::default() };
    let (p2p_network, mut p2p_handle) = P2pNetwork::new(&p2p_config).map_err(|e| anyhow::anyhow!("building P2P network: {e}"))?;
    info!(peer_id = %p2p_handle.local_peer_id, "P2P identity");
    let outbound_tx = p2p_handle.outbound_tx.clone();

    // Pipe gossip-received inputs straight into the local ingress queue.
    let ingress_for_p2p = ingress.clone();
    tokio::spawn(async move {
        while let Some(input) = p2p_handle.inbound_rx.recv().await {
            if ingress_for_p2p.send(input).await.is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move { p2p_network.run().await });

    // ── RPC server ───────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState { db: Arc::clone(&db), ingress: ingress.clone() });
    let _rpc_handle = RpcServer::new(rpc_state).start(args.rpc_addr).await.context("starting RPC server")?;

    // ── Tick loop ────────────────────────────────────────────────────────
    // Re-gossip every applied submission and announce the new tick's state
    // hash, regardless of whether the input originated locally (RPC) or
    // from a peer — gossipsub's message-id cache absorbs the resulting
    // re-broadcast of already-seen content.
    info!(consensus_timeout_ticks = DEFAULT_RESERVE_TIMEOUT_TICKS, ingress_bound = DEFAULT_INGRESS_QUEUE_BOUND, "node ready");
    let mut interval = tokio::time::interval(Duration::from_millis(args.tick_interval_ms));
    loop {
        interval.tick().await;

        // Devnet auto-consensus: this single binary hosts every signer
        // identity for the entities it replicates, so it proposes and
        // self-signs on behalf of the whole signer set as soon as an idle
        // entity's mempool is non-empty. A multi-party deployment instead
        // has each signer's own node submit its own `ReceiveSignature`,
        // carried between nodes via `P2pMessage::ReceiveSignature`.
        let ready: Vec<(xln_core::EntityId, Vec<xln_core::SignerId>)> = server
            .state()
            .entities
            .values()
            .filter(|e| e.phase == xln_entity::ConsensusPhase::Idle && !e.mempool.is_empty())
            .map(|e| (e.id, e.signers.clone()))
            .collect();
        for (entity_id, signers) in ready {
            let _ = ingress.send(ServerInput::Propose { entity_id }).await;
            for signer in signers {
                let _ = ingress.send(ServerInput::ReceiveSignature { entity_id, signer, signature: vec![0u8] }).await;
            }
        }

        match server.tick_once().await {
            Ok(frame) => {
                for record in &frame.records {
                    if let (ServerInput::SubmitEntityTx { entity_id, tx }, ServerInputOutcome::Applied) = (&record.input, &record.outcome) {
                        let msg = P2pMessage::SubmitEntityTx { entity_id: *entity_id, tx: tx.clone() };
                        let _ = outbound_tx.send(msg).await;
                    }
                }
                let _ = outbound_tx.send(P2pMessage::FrameAnnounce { tick: frame.tick, state_hash: frame.state_hash }).await;
            }
            Err(e) => warn!(error = %e, "tick failed"),
        }
    }
}

fn load_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    let path = path.context("--genesis-params is required on first run against a fresh data directory")?;
    let json = std::fs::read_to_string(path).with_context(|| format!("reading genesis params from {}", path.display()))?;
    serde_json::from_str(&json).context("parsing genesis params JSON")
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
