use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve ranked search over a built index.
#[derive(Parser)]
#[command(name = "server")]
struct Args {
    /// Index database written by `indexer build`
    #[arg(long, default_value = "./index.db")]
    index: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let Args { index, host, port } = Args::parse();

    let app = server::build_app(index.clone()).with_context(|| format!("opening index at {index}"))?;
    let addr = SocketAddr::new(host, port);
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, %index, "serving search");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
