//! xln-wallet
//!
//! Thin CLI client for an XLN node. Builds `EntityTx` payloads and submits
//! them over JSON-RPC, or reads back entity/account/frame state.
//!
//! Usage:
//!   xln-wallet entity        --entity <b58>
//!   xln-wallet account-view  --entity <b58> --counterparty <b58>
//!   xln-wallet pay           --from <b58> --to <b58> --token <id> --amount <amount> --direction <left-to-right|right-to-left>
//!   xln-wallet credit-limit  --entity <b58> --counterparty <b58> --side <left|right> --token <id> --limit <amount>
//!   xln-wallet frame         --tick <n>
//!   xln-wallet tick
//!   xln-wallet info

use anyhow::Context;
use clap::{Parser, Subcommand};

use xln_account::Direction;
use xln_core::{EntityId, Side, TokenId};
use xln_entity::{AccountTx, EntityTx};

mod rpc_client;
use rpc_client::WalletRpcClient;

#[derive(Parser, Debug)]
#[command(name = "xln-wallet", version, about = "XLN wallet — build and submit entity transactions")]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8545")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an entity's replica summary.
    Entity {
        #[arg(long)]
        entity: String,
    },

    /// Print the seven-region capacity view between two entities.
    AccountView {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        counterparty: String,
    },

    /// Submit a bilateral payment.
    Pay {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        token: TokenId,
        #[arg(long)]
        amount: u128,
        /// "left-to-right" or "right-to-left", relative to the account's
        /// canonical ordering (not necessarily `from`/`to`).
        #[arg(long, default_value = "left-to-right")]
        direction: String,
    },

    /// Update the credit limit one side extends on an account.
    CreditLimit {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        counterparty: String,
        /// "left" or "right".
        #[arg(long)]
        side: String,
        #[arg(long)]
        token: TokenId,
        #[arg(long)]
        limit: u128,
    },

    /// Fetch a committed frame by tick.
    Frame {
        #[arg(long)]
        tick: u64,
    },

    /// Print the node's latest committed tick.
    Tick,

    /// Print node and protocol version info.
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn,xln_wallet=info").init();

    let args = Args::parse();
    let client = WalletRpcClient::new(&args.rpc);

    match args.command {
        Command::Entity { entity } => {
            let result = client.get_entity(&entity).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Command::AccountView { entity, counterparty } => {
            let result = client.get_account_view(&entity, &counterparty).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Command::Pay { from, to, token, amount, direction } => {
            let from_id = EntityId::from_b58(&from).map_err(|e| anyhow::anyhow!("invalid from entity: {e}"))?;
            let to_id = EntityId::from_b58(&to).map_err(|e| anyhow::anyhow!("invalid to entity: {e}"))?;
            let dir = parse_direction(&direction)?;
            let tx = EntityTx::AccountInput {
                from_entity_id: from_id,
                to_entity_id: to_id,
                account_tx: AccountTx::Payment { token_id: token, amount, direction: dir },
                metadata: None,
            };
            let tx_id = submit(&client, &from, &tx).await?;
            println!("Submitted: {}", tx_id);
            Ok(())
        }

        Command::CreditLimit { entity, counterparty, side, token, limit } => {
            let entity_id = EntityId::from_b58(&entity).map_err(|e| anyhow::anyhow!("invalid entity: {e}"))?;
            let counterparty_id =
                EntityId::from_b58(&counterparty).map_err(|e| anyhow::anyhow!("invalid counterparty: {e}"))?;
            let side = parse_side(&side)?;
            let tx = EntityTx::AccountInput {
                from_entity_id: entity_id,
                to_entity_id: counterparty_id,
                account_tx: AccountTx::CreditLimit { side, token_id: token, new_limit: limit },
                metadata: None,
            };
            let tx_id = submit(&client, &entity, &tx).await?;
            println!("Submitted: {}", tx_id);
            Ok(())
        }

        Command::Frame { tick } => {
            let result = client.get_frame(tick).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Command::Tick => {
            let tick = client.get_current_tick().await?;
            println!("{}", tick);
            Ok(())
        }

        Command::Info => {
            let info = client.get_version().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
    }
}

async fn submit(client: &WalletRpcClient, entity_id_b58: &str, tx: &EntityTx) -> anyhow::Result<String> {
    let bytes = bincode::serialize(tx).context("serializing EntityTx")?;
    let tx_hex = hex::encode(bytes);
    client.submit_entity_tx(entity_id_b58, &tx_hex).await
}

fn parse_direction(s: &str) -> anyhow::Result<Direction> {
    match s {
        "left-to-right" => Ok(Direction::LeftToRight),
        "right-to-left" => Ok(Direction::RightToLeft),
        other => anyhow::bail!("invalid direction '{other}', expected left-to-right or right-to-left"),
    }
}

fn parse_side(s: &str) -> anyhow::Result<Side> {
    match s {
        "left" => Ok(Side::Left),
        "right" => Ok(Side::Right),
        other => anyhow::bail!("invalid side '{other}', expected left or right"),
    }
}
