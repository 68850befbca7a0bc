//! ContentAgent CLI: content strategy and creation with Gemini.
//!
//! Turns a topic into a market analysis, a three-month content plan, and
//! finished content packages, each saved as JSON.

mod commands;
mod menu;
mod render;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
