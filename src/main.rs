//! craftcost - raw-material bills for crafted items

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = craftcost::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
