// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sign tutor - replay recorded hand landmarks through the recognizer
#[derive(Parser, Debug)]
#[command(name = "sign_tutor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pipeline config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Progress file (defaults to the platform data directory)
    #[arg(short, long, global = true)]
    pub progress: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run recorded detector frames through the pipeline
    Replay {
        /// JSON lines file, one detector frame per line
        #[arg(short, long)]
        input: PathBuf,

        /// Sign being practiced; each prediction is recorded as an attempt
        #[arg(short, long)]
        target: Option<String>,

        /// Write attempts.csv and report.html under this directory
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Session name for the export directory
        #[arg(long)]
        name: Option<String>,
    },

    /// Print stored practice progress
    Summary,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
