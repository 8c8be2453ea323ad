//! Layered Configs CLI
//!
//! Resolves a layered YAML configuration the same way the library does and
//! prints values from it.

use anyhow::Result;
use clap::Parser;
use layered_configs::Configs;
use layered_configs::cli::{Cli, Command, error_message};
use layered_configs::format::format_value;
use layered_configs::logging::{self, LogTarget};
use tracing::debug;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Failed to initialise logging: {e}");
    }

    if let Err(e) = run(cli).await {
        debug!(error = %e, "Command failed");
        eprintln!("{}", error_message(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = cli.source.to_options()?;
    let configs = Configs::new(options)?;

    match cli.command {
        Command::Get(args) => {
            debug!(key = %args.key, "Resolving key");
            let value = configs.get(&args.key).await?;
            println!("{}", format_value(value.as_ref(), args.output_format())?);
        }
        Command::Check => {
            println!("environment: {}", configs.environment());
            println!("directory: {}", configs.directory().display());
            for file in configs.files() {
                println!("  {}", file.display());
            }
        }
    }

    Ok(())
}
