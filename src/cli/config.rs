//! Handler for the `config` subcommand.

use crate::app::Engine;
use crate::cli::output;
use crate::config::Config;
use crate::error::Result;

/// Print the current configuration snapshot.
pub fn execute_show() -> Result<()> {
    let config = Config::from_env()?;
    output::section("Configuration");
    output::field("arb_threshold", config.arb_threshold);
    output::field("min_liquidity", config.min_liquidity);
    output::field("max_position_size", config.max_position_size);
    output::field("venue_a_fee_rate", config.venue_a_fee_rate);
    output::field("venue_b_fee_rate", config.venue_b_fee_rate);
    output::field("similarity_threshold", config.similarity_threshold);
    output::field("auto_execute", config.auto_execute());
    Ok(())
}

/// Boot the engine, flip `auto_execute`, and report the new value.
///
/// Without the HTTP/WebSocket layer named in spec §6, there is no running
/// process to address out of band, so this only affects the engine this
/// invocation boots.
pub async fn execute_set_auto_execute(enabled: bool) -> Result<()> {
    let config = Config::from_env()?;
    let engine = Engine::bootstrap(config).await?;
    let handle = engine.handle();

    handle.set_auto_execute(enabled);
    output::success(&format!("auto_execute set to {enabled}"));

    engine.shutdown().await;
    Ok(())
}
