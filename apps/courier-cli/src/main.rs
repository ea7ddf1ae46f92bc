//! # Courier CLI
//!
//! Drives the courier client from a terminal.
//!
//! ## Usage
//! ```bash
//! courier login 9876543210 123456
//! courier orders
//! courier accept T1
//! courier start T1 --at 12.9716,77.5946
//! courier complete T1 --signature "R. Kumar"
//! courier earnings week
//! courier profile --refresh
//! courier logout
//!
//! # Use a specific config file
//! courier --config ./courier.toml status
//! ```
//!
//! ## Exit Codes
//! | Code | Meaning                                    |
//! |------|--------------------------------------------|
//! | 0    | Success                                    |
//! | 1    | Storage or other local failure             |
//! | 2    | Bad arguments or invalid input             |
//! | 3    | Not signed in, sign-in refused, or expired |
//! | 4    | Backend unreachable (retry)                |
//! | 5    | Refused by the backend or by the lifecycle |
//! | 6    | Configuration problem                      |

mod commands;

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use courier_client::{ClientConfig, CourierClient};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = match commands::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version land here too, with exit code 0.
            let _ = e.print();
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2));
        }
    };
    debug!(command = ?cli.command, "Parsed command line");

    let config = match ClientConfig::load(cli.config) {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    let client = match CourierClient::builder(config).build().await {
        Ok(client) => client,
        Err(e) => return fail(&e),
    };

    let result = commands::run(&client, cli.command).await;
    client.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn fail(err: &courier_client::ClientError) -> ExitCode {
    error!(error = %err, "Command failed");
    eprintln!("error: {}", err);
    ExitCode::from(commands::exit_code(err))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=courier=trace` - Trace the courier crates only
/// - Default: INFO, with debug for the courier crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,courier=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
