//! Handler for the `markets` subcommand.

use crate::app::Engine;
use crate::cli::output;
use crate::config::Config;
use crate::error::Result;

/// Boot the engine just long enough to fetch venue listings and re-run the
/// identity resolver, then shut down.
pub async fn execute_sync() -> Result<()> {
    let config = Config::from_env()?;
    let engine = Engine::bootstrap(config).await?;
    let handle = engine.handle();

    output::section("Market sync");
    let summary = handle.sync_markets().await;
    engine.shutdown().await;

    match summary {
        Ok(message) => {
            output::success(&message);
            Ok(())
        }
        Err(err) => {
            output::error(&format!("market sync failed: {err}"));
            Err(err)
        }
    }
}
