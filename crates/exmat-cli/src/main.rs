//! exmat CLI: expression materialization from the command line

use clap::Parser;
use exmat_cli::{CliConfig, Cli, CommandExecutor};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    let mut executor = CommandExecutor::with_config(config);
    let result = executor.execute(cli.command)?;

    if !result.success {
        eprintln!("Error: {}", result.message);
        std::process::exit(1);
    }

    Ok(())
}
