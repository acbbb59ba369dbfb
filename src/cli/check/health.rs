use crate::cli::output;
use crate::error::Result;

use super::{execute_config, execute_connection};

/// Run `check config` then `check connection`, stopping at the first failure.
pub async fn execute_health() -> Result<()> {
    execute_config()?;
    execute_connection().await?;
    output::section("Health");
    output::success("all checks passed");
    Ok(())
}
