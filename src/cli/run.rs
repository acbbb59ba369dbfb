//! Handler for the `run` command.

use tokio::signal;
use tracing::info;

use crate::app::Engine;
use crate::config::Config;
use crate::error::Result;

/// Bootstrap the engine and run until Ctrl+C.
pub async fn execute(log_level: Option<String>) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(level) = log_level {
        config.log_level = level;
    }
    config.init_logging();

    info!(port = config.port, "duoedge starting");

    let engine = Engine::bootstrap(config).await?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown signal received (Ctrl+C)");
        }
    }

    engine.shutdown().await;
    info!("duoedge stopped");
    Ok(())
}
