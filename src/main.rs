use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use addonscan::api::{self, AppState};
use addonscan::pipeline::Scheduler;
use addonscan::store::ScanStore;

#[derive(Parser, Debug)]
#[command(name = "addonscan")]
#[command(about = "Scan browser extensions for security issues over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Evict finished scans after this many seconds (0 keeps them forever)
    #[arg(long, default_value_t = 0)]
    scan_ttl_secs: u64,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 50)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "addonscan=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = ScanStore::new();
    if args.scan_ttl_secs > 0 {
        store.spawn_sweeper(Duration::from_secs(args.scan_ttl_secs));
    }
    let scheduler = Scheduler::new();

    let app = api::router(
        AppState {
            store,
            scheduler: scheduler.clone(),
        },
        args.max_upload_mb,
    );

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight scans reach a terminal state before exiting.
    scheduler.drain().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
