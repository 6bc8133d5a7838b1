use clap::Parser;
use portico::cli::{run_cli, Cli};
use portico::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}
