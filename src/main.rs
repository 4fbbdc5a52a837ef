use crawldb::{config::Config, DbClient};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default location of the configuration file
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// The main entry point for the persister.
///
/// Loads the configuration, connects to the database (creating the tables
/// if asked to), keeps the persister running until Ctrl+C or SIGTERM and
/// then shuts it down gracefully.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&path)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("crawldb starting with config: {:?}", config);

    let cancel = CancellationToken::new();
    let client = DbClient::connect(&config, cancel.clone()).await?;
    info!("persister running, press Ctrl+C to stop");

    wait_for_signal().await;
    cancel.cancel();

    let stats = client.close().await;
    info!(
        "crawldb shutdown complete: {} records, {} operations executed, {} lost",
        stats.records_received, stats.operations_executed, stats.operations_lost
    );
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, initiating shutdown"),
                    _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                }
            }
            Err(e) => {
                tracing::warn!("unable to install SIGTERM handler: {}", e);
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received Ctrl+C, initiating shutdown");
    }
}
