//! Onsa - A2A agent registry and task dispatch
//!
//! CLI entry point for the Onsa server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod api;
mod cli;
mod server;
mod websocket;

use server::config::{LogFormat, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = server::load_config()?;
    let _guard = init_tracing(&config.logging);

    let cli = cli::Cli::parse();
    cli::run(cli, config).await
}

/// Install the global subscriber. The returned guard flushes the log file
/// on drop and must live as long as the process.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "onsa=info,onsa_core=info,tower_http=info".into());

    let console = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    let (file, guard) = match &logging.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "onsa.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    guard
}
