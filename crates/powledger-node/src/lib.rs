//! HTTP shell around a single [`BlockChain`].
//!
//! Every route goes through one `tokio::sync::Mutex`, so submitting, mining
//! and dumping never interleave. Resolving holds it only to read the peer list
//! and to apply the result, not while peers are being fetched.

pub mod constants;
pub mod peers;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use constants::{DEFAULT_HOST, DEFAULT_PEER_TIMEOUT_SECS, DEFAULT_PORT};
use peers::PeerClient;
use powledger_core::{
    constants::DIFFICULTY, unix_now, Block, BlockChain, ChainConfig, ChainError, Transaction,
};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn, Level};

#[derive(Parser, Debug, Clone)]
#[command(name = "powledger-node")]
#[command(about = "Proof-of-work ledger node")]
pub struct Args {
    /// Interface to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Leading zero hex digits required of every block hash
    #[arg(long, default_value_t = DIFFICULTY)]
    pub difficulty: usize,

    /// Seal blocks without a Merkle commitment
    #[arg(long)]
    pub no_merkle: bool,

    /// Keep the timestamp a submitter sends instead of stamping receipt time
    #[arg(long)]
    pub keep_tx_timestamps: bool,

    /// Peer base URL to register at startup (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Per-peer request timeout during conflict resolution
    #[arg(long, default_value_t = DEFAULT_PEER_TIMEOUT_SECS)]
    pub peer_timeout_secs: u64,

    /// Abandon a mine request after this many seconds
    #[arg(long)]
    pub mine_timeout_secs: Option<u64>,
}

impl Args {
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            difficulty: self.difficulty,
            merkle: !self.no_merkle,
            stamp_on_receipt: !self.keep_tx_timestamps,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone)]
pub struct AppState {
    chain: Arc<Mutex<BlockChain>>,
    peers: PeerClient,
    mine_timeout: Option<Duration>,
}

impl AppState {
    /// Mines genesis off the async runtime and registers the startup peers.
    pub async fn from_args(args: &Args) -> anyhow::Result<Self> {
        let config = args.chain_config();
        let mut chain = tokio::task::spawn_blocking(move || BlockChain::new(config)).await??;
        for peer in &args.peers {
            chain.add_node(peer);
        }
        Ok(Self {
            chain: Arc::new(Mutex::new(chain)),
            peers: PeerClient::new(Duration::from_secs(args.peer_timeout_secs))?,
            mine_timeout: args.mine_timeout_secs.map(Duration::from_secs),
        })
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: u64,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

#[derive(Serialize)]
struct Resolved {
    replaced: bool,
    length: usize,
}

pub enum ApiError {
    /// No block was produced; the pool is untouched.
    Mining(ChainError),
    Internal(anyhow::Error),
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Encoding(e) => Self::Internal(e.into()),
            other => Self::Mining(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Mining(err) => {
                warn!(%err, "no block produced");
                (StatusCode::CONFLICT, "NO_BLOCK", err.to_string())
            }
            ApiError::Internal(err) => {
                error!("internal error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error".to_string(),
                )
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": { "code": code, "message": message } })),
        )
            .into_response()
    }
}

/// Raises the flag when dropped, which stops a running search if the client
/// goes away before mining finishes.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn log_state(chain: &BlockChain) {
    if tracing::enabled!(Level::DEBUG) {
        debug!(
            height = chain.len(),
            pending = chain.pending().len(),
            peers = chain.nodes().len(),
            "state:\n{}",
            chain.dump()
        );
    }
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(tx): Json<TxIn>,
) -> (StatusCode, Json<Transaction>) {
    let tx = Transaction::with_timestamp(
        tx.timestamp.unwrap_or_else(unix_now),
        tx.sender,
        tx.recipient,
        tx.amount,
    );
    let mut chain = state.chain.lock().await;
    let pooled = chain.add_transaction(&tx).clone();
    log_state(&chain);
    (StatusCode::CREATED, Json(pooled))
}

async fn pending_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.chain.lock().await.pending().to_vec())
}

async fn mine(State(state): State<AppState>) -> Result<Json<Block>, ApiError> {
    let mut chain = state.chain.clone().lock_owned().await;
    let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
    let flag = cancel.0.clone();
    let timer = state.mine_timeout.map(|timeout| {
        let flag = cancel.0.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            flag.store(true, Ordering::Relaxed);
        })
    });

    let mined = tokio::task::spawn_blocking(move || {
        let mined = chain.mine_until(unix_now(), &flag).cloned();
        log_state(&chain);
        mined
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    if let Some(timer) = timer {
        timer.abort();
    }
    drop(cancel);
    Ok(Json(mined?))
}

async fn chains(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.chain.lock().await.chain().to_vec())
}

async fn register_nodes(
    State(state): State<AppState>,
    Json(nodes): Json<Vec<String>>,
) -> (StatusCode, Json<Nodes>) {
    let mut chain = state.chain.lock().await;
    for node in &nodes {
        if chain.add_node(node) {
            info!(%node, "peer registered");
        }
    }
    log_state(&chain);
    (
        StatusCode::CREATED,
        Json(Nodes {
            nodes: chain.nodes().to_vec(),
        }),
    )
}

async fn list_nodes(State(state): State<AppState>) -> Json<Nodes> {
    Json(Nodes {
        nodes: state.chain.lock().await.nodes().to_vec(),
    })
}

/// Peers are fetched without holding the chain lock, so nodes that list each
/// other can serve `/chains` while resolving. The length bar is taken from
/// the chain as it is once the lock is re-acquired.
async fn resolve(State(state): State<AppState>) -> Json<Resolved> {
    let nodes = state.chain.lock().await.nodes().to_vec();
    let snapshots = state.peers.snapshots(&nodes).await;
    let mut chain = state.chain.lock().await;
    let replaced = chain.resolve_conflicts(snapshots);
    log_state(&chain);
    Json(Resolved {
        replaced,
        length: chain.len(),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route(
            "/transactions",
            post(create_transaction).get(pending_transactions),
        )
        .route("/mine", post(mine))
        .route(constants::CHAINS_PATH, get(chains))
        .route("/nodes", post(register_nodes).get(list_nodes))
        .route("/nodes/resolve", get(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
