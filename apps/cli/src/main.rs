//! Market Analyst CLI: SWOT market reports from web search plus a local
//! document index.

mod commands;
mod display;
mod remote;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
