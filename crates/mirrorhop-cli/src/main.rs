//! mirrorhop CLI - find the first live mirror and redirect to it.

use mirrorhop_cli::error::exit_code_from_error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match mirrorhop_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}
