use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "powledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, env = "POWLEDGER_NODE", default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: u64,
        /// Explicit timestamp (unix seconds); the node may overwrite it
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Mine the pending pool into a new block
    Mine,
    /// Print the node's chain
    Chain,
    /// Print the pending pool
    Pending,
    /// Register peer base URLs
    Register {
        #[arg(required = true)]
        peers: Vec<String>,
    },
    /// Print registered peers
    Peers,
    /// Ask the node to adopt the longest valid peer chain
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();
    let req = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
            timestamp,
        } => {
            let tx = Tx {
                sender,
                recipient,
                amount,
                timestamp,
            };
            client.post(format!("{node}/transactions")).json(&tx)
        }
        Command::Mine => client.post(format!("{node}/mine")),
        Command::Chain => client.get(format!("{node}/chains")),
        Command::Pending => client.get(format!("{node}/transactions")),
        Command::Register { peers } => client.post(format!("{node}/nodes")).json(&peers),
        Command::Peers => client.get(format!("{node}/nodes")),
        Command::Resolve => client.get(format!("{node}/nodes/resolve")),
    };

    debug!(?req, "sending request");
    let res = req.send().await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
