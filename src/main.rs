//! # tabletalk command-line entry point
//!
//! ```bash
//! tabletalk load --file data/sales.csv
//! tabletalk ask "Which region had the highest total sales?"
//! tabletalk -v ask "Average order value per channel"
//! ```
//!
//! Ctrl-C cancels the request in flight; the process then exits with a non-zero
//! status like any other rejected request.

#![expect(clippy::print_stdout, clippy::print_stderr, reason = "command-line output")]

mod cli;

use clap::Parser as _;
use std::process::ExitCode;
use tabletalk::pipeline::CancellationToken;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = tabletalk::logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let result = runtime.block_on(async move {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling the current request");
                on_interrupt.cancel();
            }
        });

        cli::run_command(cli, cancel).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Ok(log_path) = tabletalk::logging::get_current_log_path() {
                eprintln!("Details may be in {}", log_path.display());
            }
            ExitCode::FAILURE
        }
    }
}
