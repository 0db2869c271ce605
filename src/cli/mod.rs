//! CLI Module
//!
//! Offline front end for the player: render files to a multichannel WAV or
//! print their lengths.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tapedeck - multi-file player and recorder engine
#[derive(Parser, Debug)]
#[command(name = "tapedeck-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play files in lockstep and write every bus to one WAV file
    Render {
        /// Input files, one line each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Samples per processed block
        #[arg(long, default_value_t = 512)]
        block_size: usize,

        /// Host sample rate
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,

        /// Start position in seconds
        #[arg(long)]
        seek: Option<f64>,

        /// Loop every line (requires --max-seconds)
        #[arg(long = "loop")]
        looping: bool,

        /// Stop rendering after this many seconds
        #[arg(long)]
        max_seconds: Option<f64>,

        /// JSON engine configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the length of each file and the longest line
    Info {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
