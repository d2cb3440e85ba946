//! modpoll - cron-driven telemetry poller.
//!
//! Main entry point for the modpoll CLI and server.

mod cli;
mod server;

use clap::Parser;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = server::load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or_default() {
        Commands::Run { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            server::init_tracing(&config.logging)?;
            server::run_server(config).await
        }
        Commands::Check => {
            server::init_tracing(&config.logging)?;
            server::validate_config(&config)?;
            tracing::info!("Configuration is valid");
            Ok(())
        }
    }
}
