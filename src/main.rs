//! Arbor CLI - evolve and inspect genetic programs.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Arbor - a tree-based genetic programming engine
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve a program for the built-in regression target
    Solve {
        /// Population size
        #[arg(short, long, default_value = "1000")]
        population: usize,

        /// Maximum number of generations
        #[arg(short, long, default_value = "500")]
        generations: usize,

        /// Number of sample points drawn from the target
        #[arg(long, default_value = "32")]
        samples: usize,

        /// Maximum tree depth for generated programs
        #[arg(long, default_value = "5")]
        max_depth: usize,

        /// Width budget for generated programs
        #[arg(long, default_value = "6")]
        max_width: usize,

        /// Random seed (default: derived from the clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,

        /// Print per-cycle statistics to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate and print one random program
    Sample {
        /// Number of call parameters
        #[arg(short, long, default_value = "2")]
        params: usize,

        /// Maximum tree depth
        #[arg(long, default_value = "5")]
        max_depth: usize,

        /// Width budget
        #[arg(long, default_value = "6")]
        max_width: usize,

        /// Random seed (default: OS entropy)
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Solve {
            population,
            generations,
            samples,
            max_depth,
            max_width,
            seed,
            format,
            progress,
            verbose,
        } => cli::solve::execute(
            population,
            generations,
            samples,
            max_depth,
            max_width,
            seed,
            format,
            progress,
            verbose,
        ),

        Commands::Sample {
            params,
            max_depth,
            max_width,
            seed,
        } => cli::sample::execute(params, max_depth, max_width, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
