use crate::cli::output;
use crate::config::Config;
use crate::error::Result;

/// Load configuration from the environment and report the resolved values.
pub fn execute_config() -> Result<()> {
    let config = Config::from_env()?;

    output::section("Configuration");
    output::field("arb_threshold", config.arb_threshold);
    output::field("min_liquidity", config.min_liquidity);
    output::field("max_position_size", config.max_position_size);
    output::field("similarity_threshold", config.similarity_threshold);
    output::field("auto_execute", config.auto_execute());
    output::field("database_url", &config.database_url);
    output::field("port", config.port);
    output::success("configuration is valid");
    Ok(())
}
