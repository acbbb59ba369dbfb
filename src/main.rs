use clap::Parser;
use tracing::error;

use duoedge::cli::{check, markets, config as cli_config, run, Cli, CheckCommands, Commands, ConfigCommands, MarketsCommands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run::execute(cli.log_level).await,
        Commands::Check { command } => match command {
            CheckCommands::Config => check::execute_config(),
            CheckCommands::Connection => check::execute_connection().await,
            CheckCommands::Health => check::execute_health().await,
        },
        Commands::Markets { command } => match command {
            MarketsCommands::Sync => markets::execute_sync().await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli_config::execute_show(),
            ConfigCommands::SetAutoExecute { enabled } => {
                cli_config::execute_set_auto_execute(enabled).await
            }
        },
    };

    if let Err(err) = result {
        error!(error = %err, code = err.code(), "duoedge exited with error");
        std::process::exit(1);
    }
}
