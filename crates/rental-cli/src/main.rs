//! # rental CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rental_cli::capabilities::{run_capabilities, CapabilitiesArgs};
use rental_cli::check::{run_check, CheckArgs};
use rental_cli::matrix::{run_matrix, MatrixArgs};

/// Inspect the equipment loan lifecycle without a running server.
#[derive(Parser, Debug)]
#[command(name = "rental", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    /// Ignored when `RUST_LOG` is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every (state, actor) row with its allowed targets.
    Matrix(MatrixArgs),

    /// Evaluate a single transition request.
    Check(CheckArgs),

    /// Print the capability flags of one state.
    Capabilities(CapabilitiesArgs),
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Matrix(args) => run_matrix(args, &mut stdout),
        Commands::Check(args) => run_check(args, &mut stdout),
        Commands::Capabilities(args) => run_capabilities(args, &mut stdout),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
