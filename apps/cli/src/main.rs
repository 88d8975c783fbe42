//! CourseCraft CLI: domain-scoped research answers packaged as learning content.
//!
//! Asks a completion API or a search API, keeps the last answer in a local
//! session file, and exports it as PDF, Word, CSV or slides inside a SCORM
//! package.

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
