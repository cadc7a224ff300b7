//! Pixland Control - CLI for canvas keys, player levels and job polling

use anyhow::Result;
use clap::Parser;
use pixlandctl::cli::Cli;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = pixlandctl::load_config(&cli)?;

    pixlandctl::logging::init(&config.log.level);
    debug!("pixlandctl v{} starting", env!("CARGO_PKG_VERSION"));

    let output = pixlandctl::run(cli, &config).await?;
    println!("{}", output.text);

    if !output.success {
        std::process::exit(2);
    }
    Ok(())
}
