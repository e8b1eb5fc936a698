//! ShroudNet daemon and CLI
//!
//! `shroud serve` hosts the shared record; every other subcommand signs
//! member submissions against a running daemon.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use service::{Config, ServiceState};

use shroud_app::http::api::client::ApiClient;
use shroud_app::http::api::v0::net::MessagesRequest;
use shroud_app::{commands, identity, serve};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// ShroudNet - confidential group messaging over a public ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the daemon's API
    #[arg(long, default_value = "http://localhost:3000", global = true)]
    api_url: String,

    /// Path to the identity PEM (defaults to the user config dir)
    #[arg(long, global = true)]
    identity: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host the shared record and submission API
    Serve {
        /// Address for the API server to listen on
        #[arg(long, default_value = "0.0.0.0:3000")]
        listen: String,
    },
    /// Generate a local identity key
    Keygen {
        /// Replace an existing identity
        #[arg(long)]
        force: bool,
    },
    /// List all nets on the record
    Nets,
    /// Create a new net with an encrypted shared key
    Create {
        /// Net name
        #[arg(long)]
        name: String,
        /// Shared key as "0x"-prefixed hex (20 bytes); random if omitted
        #[arg(long)]
        key: Option<String>,
    },
    /// Join a net and gain decryption rights for its key
    Join {
        /// Net id
        #[arg(long)]
        net_id: u64,
    },
    /// Recover and print a net's shared key via the gate handshake
    DecryptKey {
        /// Net id
        #[arg(long)]
        net_id: u64,
    },
    /// Encrypt and send a text message to a net
    Send {
        /// Net id
        #[arg(long)]
        net_id: u64,
        /// Message text (encrypted locally before submission)
        #[arg(long)]
        message: String,
    },
    /// Read a page of a net's message log
    Messages {
        #[command(flatten)]
        request: MessagesRequest,
        /// Recover the shared key and decrypt each payload
        #[arg(long)]
        decrypt: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let log_level: tracing::Level = cli.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    let identity_path = cli
        .identity
        .clone()
        .unwrap_or_else(identity::default_identity_path);

    match cli.command {
        Command::Serve { listen } => run_daemon(&listen, identity_path).await,
        Command::Keygen { force } => {
            let key = identity::generate(&identity_path, force)?;
            println!(
                "identity {} written to {}",
                key.public(),
                identity_path.display()
            );
            Ok(())
        }
        command => {
            let api = ApiClient::new(&cli.api_url)?;
            let key = identity::load(&identity_path)?;
            match command {
                Command::Nets => commands::nets(&api, &key).await,
                Command::Create { name, key: shared } => {
                    commands::create(&api, &key, &name, shared.as_deref()).await
                }
                Command::Join { net_id } => commands::join(&api, &key, net_id).await,
                Command::DecryptKey { net_id } => commands::decrypt_key(&api, &key, net_id).await,
                Command::Send { net_id, message } => {
                    commands::send(&api, &key, net_id, &message).await
                }
                Command::Messages { request, decrypt } => {
                    commands::messages(&api, &key, request, decrypt).await
                }
                Command::Serve { .. } | Command::Keygen { .. } => unreachable!(),
            }
        }
    }
}

async fn run_daemon(listen: &str, identity_path: PathBuf) -> Result<()> {
    tracing::info!("Starting ShroudNet daemon");

    let listen_addr = SocketAddr::from_str(listen)?;
    let mut config = Config::default();
    config.api_listen_addr = Some(listen_addr);
    if identity_path.exists() {
        config.node_secret_path = Some(identity_path);
    }

    let state = match ServiceState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create service state: {}", e);
            std::process::exit(1);
        }
    };

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    tokio::spawn(graceful_shutdown);

    let api_rx = shutdown_rx.clone();
    let api_handle = tokio::spawn(async move {
        tracing::info!("Starting API server on {}", listen_addr);
        if let Err(e) = serve::run_api_server(listen_addr, state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    // Wait for shutdown
    let mut shutdown_rx = shutdown_rx;
    let _ = shutdown_rx.changed().await;

    let _ = tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, futures::future::join_all([api_handle]))
        .await;

    tracing::info!("Daemon shutdown complete");
    Ok(())
}
