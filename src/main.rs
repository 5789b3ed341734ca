//! paperup CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, runs the selected mode
//! and turns failures into a user-friendly report and an exit code.

use clap::Parser;
use colored::Colorize;
use paperup_cli::cli::{self, Cli};
use paperup_cli::core::user_friendly_error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    init_logging(&cli.build_config().log_level);

    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = cli::exit_code_for(&e);
            user_friendly_error(e).display();
            if code == 0 {
                eprintln!("{}", "No update performed; the next run will retry.".yellow());
            }
            ExitCode::from(code)
        }
    }
}

/// Log to stderr at `level` for paperup and `warn` for dependencies, unless
/// `RUST_LOG` says otherwise.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,paperup_cli={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
