// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Movecodec CLI
//!
//! Command-line front end for the event pipeline.
//!
//! ## Usage
//!
//! ```sh
//! # Stream encoded chunks for two individuals into a frame file
//! movecodec stream --data-dir data/ --study 2911040 -i A1,A2 -o out.frames
//!
//! # Build the timestamp-sorted collection and print it as JSON
//! movecodec batch --data-dir data/ --study 2911040 -i A1
//!
//! # Look inside a frame file or a raw event table
//! movecodec inspect frames out.frames
//! movecodec inspect table data/2911040.csv
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{BatchCmd, InspectCmd, StreamCmd};
use common::Result;
use tracing_subscriber::EnvFilter;

/// Movecodec - animal movement segment pipeline
///
/// Turns raw tracking tables into chunked movement segments.
#[derive(Parser, Clone)]
#[command(name = "movecodec")]
#[command(about = "Stream and encode animal movement segments", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Stream encoded chunks into a frame file
    Stream(StreamCmd),

    /// Build all chunks sorted by timestamp and print them
    Batch(BatchCmd),

    /// Inspect frame files and raw event tables
    #[command(subcommand)]
    Inspect(InspectCmd),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stream(cmd) => cmd.run(),
        Commands::Batch(cmd) => cmd.run(),
        Commands::Inspect(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
