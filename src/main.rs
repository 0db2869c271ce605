//! Tapedeck CLI
//!
//! Command-line front end for the Tapedeck playback engine.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::debug;

use tapedeck::cli::commands::{self, RenderOptions};
use tapedeck::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    debug!("Tapedeck v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Render {
            files,
            output,
            block_size,
            sample_rate,
            seek,
            looping,
            max_seconds,
            config,
        } => commands::print_render(&RenderOptions {
            files,
            output,
            block_size,
            sample_rate,
            seek,
            looping,
            max_seconds,
            config,
        }),
        Commands::Info { files } => commands::print_info(&files),
    }
}
