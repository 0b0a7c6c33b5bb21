//! exapp - deploy and register ExApp containers

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use exapp_cli::cli::Cli;
use exapp_cli::output::json::{error_code, format_error};

/// Log filter variable, e.g. `EXAPP_LOG=exapp_cli=debug`.
const LOG_ENV: &str = "EXAPP_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.wants_json();
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            match format_error(&message, error_code(&e)) {
                Ok(doc) if json => println!("{doc}"),
                _ => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}
