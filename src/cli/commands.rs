use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use super::demo::DemoRoutes;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, HttpServer};

/// Command-line interface for portico
#[derive(Parser)]
#[command(name = "portico")]
#[command(about = "Interceptor-chain dispatch for page and API handlers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the demo service
    Serve {
        /// Address to bind
        #[arg(long, env = "PORTICO_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

/// Execute the parsed command.
///
/// # Errors
///
/// Returns an error if templates fail to compile, the address cannot be
/// bound, or the server coroutine panics.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { addr } => {
            let config = RuntimeConfig::from_env();
            config.apply();

            let routes = DemoRoutes::new(&config).context("Failed to build demo routes")?;
            let handle = HttpServer(AppService::new(routes))
                .start(addr.as_str())
                .with_context(|| format!("Failed to start server on {addr}"))?;
            info!(addr = %handle.addr(), "portico demo ready");
            handle
                .join()
                .map_err(|_| anyhow!("server coroutine panicked"))
        }
    }
}
