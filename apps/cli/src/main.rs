//! topicscrape CLI: collect the top repositories of every GitHub topic.
//!
//! Fetches the topic directory, then writes one record file per topic
//! (`data/<topic>.csv` by default), skipping topics already on disk.

mod commands;

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
