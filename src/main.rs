//! Kibana alert CLI
//!
//! Run with: cargo run -- <COMMAND>
//!
//! Environment variables:
//! - KIBANA_URL: Kibana base URL (default: http://127.0.0.1:5601)
//! - KIBANA_USERNAME / KIBANA_PASSWORD: Basic auth credentials (optional)
//! - KIBANA_SPACE: Space to manage alerts in (default: the default space)
//! - KIBANA_TIMEOUT_SECS: Request timeout (default: 30)
//! - KIBANA_MIN_VERSION: Oldest supported Kibana (default: 7.7.0)
//! - KIBANA_NOTIFY_WHEN_VERSION: Oldest Kibana accepting notify_when (default: 7.11.0)
//! - RUST_LOG: Log level (default: info)
//!
//! The resulting resource state is printed to stdout as JSON.

use std::path::PathBuf;

use clap::Parser;
use kibana_alert::{
    load_config, AlertResourceHandler, KibanaConfig, ReadOutcome, ResourceState,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Manage a Kibana alert from a declarative JSON configuration.
#[derive(Debug, Parser)]
#[command(author, about, version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
#[command(rename_all = "kebab-case")]
enum Command {
    /// Create an alert from a configuration file.
    Create {
        #[arg(long)]
        config: PathBuf,
    },
    /// Read an alert's current configuration.
    Read {
        #[arg(long)]
        id: String,
    },
    /// Update an existing alert from a configuration file.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        config: PathBuf,
    },
    /// Delete an alert.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Adopt an existing alert, printing its configuration.
    Import {
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the resource state
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kibana_alert=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let kibana = KibanaConfig::from_env();

    tracing::debug!(
        url = %kibana.url,
        space = ?kibana.space_id,
        minimum_version = %kibana.minimum_version,
        notify_when_version = %kibana.notify_when_version,
        "Kibana configuration"
    );

    let handler = AlertResourceHandler::from_config(&kibana)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let state = match cli.cmd {
        Command::Create { config } => {
            let mut state = ResourceState::new(load_config(&config)?);
            handler.create(&mut state, &cancel).await?;
            state
        }
        Command::Read { id } => {
            let mut state = ResourceState::existing(id, None);
            if handler.read(&mut state, &cancel).await? == ReadOutcome::Gone {
                tracing::warn!("Alert no longer exists");
            }
            state
        }
        Command::Update { id, config } => {
            let mut state = ResourceState::existing(id, Some(load_config(&config)?));
            handler.update(&mut state, &cancel).await?;
            state
        }
        Command::Delete { id } => {
            let mut state = ResourceState::existing(id, None);
            handler.delete(&mut state, &cancel).await?;
            state
        }
        Command::Import { id } => handler.import(&id, &cancel).await?,
    };

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
