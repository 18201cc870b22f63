use std::process::ExitCode;

use futures::future;
use hrstream::{Config, Console, Scanner};

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Unable to listen for Ctrl-C: {}", e);
        future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();

    let config = Config::from_env();
    let mut console = Console::stdout();

    let scanner = match Scanner::new(config.get_adapter_index()).await {
        Ok(scanner) => scanner,
        Err(e) => {
            println!("Error: bluetooth adapter unavailable: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = hrstream::run(&scanner, &config, &mut console, interrupted()).await;

    if let Err(e) = console.status(&outcome) {
        log::error!("Failed to write output: {}", e);
    }

    if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
