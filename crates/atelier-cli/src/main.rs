//! `atelier` binary entry point.

use anyhow::Result;
use atelier_cli::{AtelierCli, CliArgs};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let cli = AtelierCli::from_args(&args)?;
    cli.run(args).await?;
    Ok(())
}
