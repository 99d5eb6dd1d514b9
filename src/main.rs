//! Provides the main entry point to the program.
use human_panic::setup_panic;
use std::process::ExitCode;

/// The main entry point to the program
fn main() -> ExitCode {
    setup_panic!();

    if let Err(error) = cyclus::cli::run_cli() {
        eprintln!("Error: {error:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
