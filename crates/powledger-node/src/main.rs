use clap::Parser;
use powledger_node::{router, AppState, Args};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    info!(difficulty = args.difficulty, merkle = !args.no_merkle, "mining genesis block");
    let state = AppState::from_args(&args).await?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.listen_addr()).await?;
    info!("powledger-node listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
