//! CLI module for Onsa
//!
//! Provides commands:
//! - `serve`: Run the A2A server
//! - `status`, `discover`, `task`: Talk to a running server

use clap::{Parser, Subcommand};

use crate::server::config::AppConfig;

pub mod remote;

/// Default server URL for client commands
pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// Onsa A2A server and client
#[derive(Parser, Debug)]
#[command(name = "onsa")]
#[command(about = "Agent registry and task dispatch over the A2A protocol")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Show health and registry statistics of a running server
    Status {
        #[arg(long, env = "ONSA_URL", default_value = DEFAULT_URL)]
        url: String,
    },
    /// List registered agents
    Discover {
        #[arg(long, env = "ONSA_URL", default_value = DEFAULT_URL)]
        url: String,
        /// Only agents advertising this capability
        #[arg(long)]
        capability: Option<String>,
        /// Only agents with this declared status (active, inactive)
        #[arg(long)]
        status: Option<String>,
    },
    /// Execute a capability
    Task {
        /// Capability name
        capability: String,
        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
        /// Send to this agent instead of any healthy one
        #[arg(long)]
        agent: Option<String>,
        #[arg(long, env = "ONSA_URL", default_value = DEFAULT_URL)]
        url: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run(config).await,
        Some(Commands::Status { url }) => remote::status(&url).await,
        Some(Commands::Discover {
            url,
            capability,
            status,
        }) => remote::discover(&url, capability, status.as_deref()).await,
        Some(Commands::Task {
            capability,
            params,
            agent,
            url,
        }) => remote::task(&url, &capability, &params, agent.as_deref()).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
