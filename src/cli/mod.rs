//! Command-line interface definitions.

pub mod check;
pub mod config;
pub mod markets;
pub mod output;
pub mod run;

use clap::{Parser, Subcommand};

/// duoedge - cross-venue arbitrage detection and execution.
#[derive(Parser, Debug)]
#[command(name = "duoedge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Override log level (debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine in the foreground until Ctrl+C
    Run,

    /// Validate configuration and venue connectivity before `run`
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },

    /// Market identity operations
    Markets {
        #[command(subcommand)]
        command: MarketsCommands,
    },

    /// Inspect or change the running configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CheckCommands {
    /// Load configuration from the environment and validate it
    Config,
    /// Reach both venues' REST APIs with a lightweight request
    Connection,
    /// Run `check config` and `check connection` together
    Health,
}

#[derive(Subcommand, Debug)]
pub enum MarketsCommands {
    /// Fetch listings from both venues and re-run the identity resolver
    Sync,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the current configuration snapshot
    Show,
    /// Enable or disable auto-execute
    SetAutoExecute {
        #[arg(value_name = "true|false")]
        enabled: bool,
    },
}
