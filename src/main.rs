//! Local IPC encryption server.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                  ENCRYPTION SERVER                    │
//!                 │                                                      │
//!   client ───────┼─▶ listener ─▶ session task ─┐                        │
//!   client ───────┼─▶ listener ─▶ session task ─┼─▶ job queue ─▶ workers │
//!   client ───────┼─▶ listener ─▶ session task ─┘   (bounded)    (fixed) │
//!                 │                    │   ▲                       │     │
//!                 │                    │   └──── job handle ◀──────┘     │
//!                 │                    ▼                                 │
//!                 │     admission controller · credential gateway        │
//!                 │                                                      │
//!                 │   console (list/params/help/exit) · signals          │
//!                 └──────────────────────────────────────────────────────┘
//! ```
//!
//! Exit statuses: 0 normal, 1 credentials or channel bind failure,
//! 3 invalid configuration, 5 log file failure, 6 resource allocation.

use clap::Parser;

use pipecrypt::lifecycle::startup::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match startup::configure(&cli) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet; the operator only has the terminal.
            eprintln!("{e}");
            std::process::exit(e.exit_code().into());
        }
    };

    let code = match startup::run(config).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code().into()
        }
    };

    // The console may still be parked on a blocking stdin read.
    std::process::exit(code);
}
