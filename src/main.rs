//! keystash - durable key-value store in a single JSON file

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = keystash::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
