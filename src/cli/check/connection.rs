use crate::cli::output;
use crate::config::Config;
use crate::error::Result;
use crate::exchange::{VenueAApi, VenueApi, VenueBApi};

/// Reach both venues' REST APIs with a lightweight listings request.
pub async fn execute_connection() -> Result<()> {
    let config = Config::from_env()?;

    output::section("Connection");

    let venue_a = VenueAApi::new(config.venue_a.api_url.clone(), config.venue_a.api_key.clone())?;
    match venue_a.list_markets().await {
        Ok(markets) => output::success(&format!("venue A reachable ({} markets)", markets.len())),
        Err(err) => {
            output::error(&format!("venue A unreachable: {err}"));
            return Err(err);
        }
    }

    let venue_b = VenueBApi::new(
        config.venue_b.api_url.clone(),
        config.venue_b.api_key.clone(),
        config.venue_b.private_key.clone(),
    )?;
    match venue_b.list_markets().await {
        Ok(markets) => output::success(&format!("venue B reachable ({} markets)", markets.len())),
        Err(err) => {
            output::error(&format!("venue B unreachable: {err}"));
            return Err(err);
        }
    }

    Ok(())
}
