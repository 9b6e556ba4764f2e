//! Server initialization and main run loop
//!
//! Contains the main `run()` function: builds the registry, registers the
//! configured agents, starts the health monitor and serves until a shutdown
//! signal arrives.

use super::config::AppConfig;
use super::loader::environment;
use super::shutdown::wait_for_shutdown_signal;
use super::validation::validate_production_config;
use crate::api::{app_router, AppState, ServerInfo};
use crate::websocket::ConnectionTable;
use anyhow::{Context, Result};
use onsa_core::{A2aClient, AgentRegistry, EchoAgent, RegistryConfig, RemoteAgent};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Id the built-in echo agent registers under
pub const ECHO_AGENT_ID: &str = "echo";

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    info!(
        "Starting {} (onsa v{})",
        config.server.name,
        env!("CARGO_PKG_VERSION")
    );

    validate_production_config(&config, &environment());

    let registry = Arc::new(AgentRegistry::with_config(RegistryConfig::from(
        &config.registry,
    )));
    let registered = register_agents(&config, &registry).await;
    info!(agents = registered, "Agent registration complete");

    registry.start().await;

    let app = app_router(AppState {
        registry: registry.clone(),
        connections: ConnectionTable::new(),
        info: ServerInfo::from(&config),
        websocket: config.websocket.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error");

    info!("Stopping health monitor...");
    registry.stop().await;

    served?;
    info!("Shutdown complete");
    Ok(())
}

/// Register the built-in agent and every reachable peer. Returns how many
/// agents were registered.
pub async fn register_agents(config: &AppConfig, registry: &AgentRegistry) -> usize {
    let mut registered = 0;

    if config.builtin.echo {
        registry
            .register(EchoAgent::descriptor(ECHO_AGENT_ID), Some(Arc::new(EchoAgent)))
            .await;
        registered += 1;
    }

    for peer in &config.peers {
        let client = match A2aClient::new(peer.endpoint.as_str()) {
            Ok(client) => client,
            Err(e) => {
                warn!(endpoint = %peer.endpoint, error = %e, "Failed to build peer client");
                continue;
            }
        };

        match RemoteAgent::connect(client, &peer.agent_id, peer.local_id.as_deref()).await {
            Ok((descriptor, agent)) => {
                info!(
                    endpoint = %peer.endpoint,
                    agent_id = %descriptor.agent_id,
                    capabilities = descriptor.capabilities.len(),
                    "Registered peer agent"
                );
                registry.register(descriptor, Some(Arc::new(agent))).await;
                registered += 1;
            }
            Err(e) => {
                warn!(
                    endpoint = %peer.endpoint,
                    agent_id = %peer.agent_id,
                    error = %e,
                    "Peer agent unreachable; skipping"
                );
            }
        }
    }

    registered
}
