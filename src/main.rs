//! Pipelane - pipeline stage layout for continuous-delivery deployments

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = pipelane_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
