//! CLI definitions for modpoll.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// modpoll CLI.
#[derive(Parser)]
#[command(name = "modpoll")]
#[command(about = "Cron-driven telemetry poller for register-read devices")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to config/modpoll.toml, then the
    /// user config directory)
    #[arg(short, long, global = true, env = "MODPOLL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the poller and its HTTP API in foreground (default)
    Run {
        /// Server host, overrides [server].host
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides [server].port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate the configuration and exit
    Check,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run {
            host: None,
            port: None,
        }
    }
}
