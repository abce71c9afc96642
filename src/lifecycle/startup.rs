//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, credentials and metrics in dependency order
//! - Start the operator console and signal handler
//! - Bind the channel and run the server until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use crate::config::{load_config, ConfigOverrides, ServerConfig};
use crate::credentials::{CredentialGateway, MemoryCredentialStore};
use crate::error::ServerError;
use crate::lifecycle::{console::Console, shutdown::Shutdown, signals};
use crate::observability::{logging, metrics, CONSOLE_TARGET};
use crate::server::Server;

/// Command-line arguments of the server binary.
#[derive(Debug, Parser)]
#[command(name = "pipecrypt")]
#[command(about = "Local IPC encryption server", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Channel name (socket under the runtime directory).
    #[arg(long)]
    pub channel: Option<String>,

    /// Explicit socket path, overriding --channel.
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Log file path.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Credential file path.
    #[arg(long)]
    pub cred_file: Option<PathBuf>,

    /// Maximum number of concurrent clients.
    #[arg(long)]
    pub max_clients: Option<usize>,

    /// Number of encryption workers.
    #[arg(long)]
    pub workers: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            channel: self.channel.clone(),
            socket: self.socket.clone(),
            log_file: self.log_file.clone(),
            cred_file: self.cred_file.clone(),
            max_clients: self.max_clients,
            workers: self.workers,
        }
    }
}

/// Load configuration from the command line.
pub fn configure(cli: &Cli) -> Result<ServerConfig, ServerError> {
    Ok(load_config(cli.config.as_deref(), cli.overrides())?)
}

fn log_parameters(config: &ServerConfig) {
    tracing::info!(target: CONSOLE_TARGET, "Server started with parameters:");
    tracing::info!(target: CONSOLE_TARGET, "channel: {}", config.channel.socket_path().display());
    tracing::info!(target: CONSOLE_TARGET, "logging file: {}", config.logging.file.display());
    tracing::info!(target: CONSOLE_TARGET, "max number of clients: {}", config.limits.max_clients);
    tracing::info!(target: CONSOLE_TARGET, "number of workers: {}", config.limits.workers);
    tracing::info!(target: CONSOLE_TARGET, "cred file: {}", config.credentials.file.display());
}

/// Run the server with an already validated configuration.
///
/// Logging must not be initialized yet; this installs the global subscriber.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    logging::init(&config.logging)?;
    log_parameters(&config);

    let store = MemoryCredentialStore::load(&config.credentials.file).inspect_err(|e| {
        tracing::error!(target: CONSOLE_TARGET, error = %e, "Could not load credentials!");
    })?;
    tracing::info!(users = store.len(), "Credentials loaded");
    let credentials = Arc::new(CredentialGateway::new(store));

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(target: CONSOLE_TARGET, error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                target: CONSOLE_TARGET,
                metrics_address = %addr,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let config = Arc::new(config);
    let server = Server::new(Arc::clone(&config), Arc::clone(&credentials)).inspect_err(|e| {
        tracing::error!(target: CONSOLE_TARGET, error = %e, "Server initialization failed");
    })?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let console = Console {
        credentials,
        config,
        shutdown: shutdown.clone(),
    };
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = console.run(stdin, tokio::io::stdout()).await {
            tracing::warn!(error = %e, "Operator console stopped");
        }
    });

    server.run(shutdown.subscribe()).await?;
    tracing::info!(target: CONSOLE_TARGET, "exiting...");
    Ok(())
}
