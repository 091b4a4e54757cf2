//! Fall Watch - Main Entry Point

use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1);
    let config = AppConfig::load(path.as_deref())?;

    init_logging(&config.logging)?;

    info!("=== Fall Watch v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Confirmation window {}s, fall threshold {} G",
        config.escalation.confirmation_window_secs, config.telemetry.threshold_g
    );

    run_server(config).await?;

    Ok(())
}
