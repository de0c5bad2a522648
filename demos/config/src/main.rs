//! Config Demo
//!
//! Starts a Telestion service without connecting anywhere and prints the
//! configuration it was assembled with as JSON on stdout.
//!
//! Any parameter the service does not declare ends up in the output as an
//! extension, so this is a quick way to see how a command line, environment
//! and config file combine.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package telestion-config -- --dev --SERVICE_NAME demo --THRESHOLD 5
//! CONFIG_FILE=config.json CONFIG_KEY=demo cargo run --package telestion-config
//! ```
//!
//! Pass `--WAIT` to keep the service running until Ctrl+C.

use anyhow::Result;
use telestion::prelude::*;
use telestion::runtime::logging;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_for_args(std::env::args_os());

    let service = start_service_or_exit(Options::new());

    if let Some(endpoint) = &service.nats {
        info!(url = %endpoint.url, "NATS endpoint prepared");
    }
    debug!(
        report = %String::from_utf8_lossy(&json_encode(&HealthReport::healthy(&service.service_name))?),
        subject = HEALTH_SUBJECT,
        "Health check response"
    );

    println!("{}", serde_json::to_string_pretty(&service.config)?);

    let wait = match service.config.extension_as::<bool>("WAIT") {
        Some(wait) => wait?,
        None => false,
    };
    if wait {
        let signal = wait_for_interrupt().await;
        info!(?signal, "Service stopped");
    }

    Ok(())
}
