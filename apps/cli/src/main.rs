//! webscratch CLI — builds the Scratch 1.4 sources into JavaScript.
//!
//! Unpacks the vendor archives, waits for the hand-made Smalltalk file-out,
//! recodes it to UTF-8, and hands it to an external JS shell for compilation.

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
