//! Server configuration types
//!
//! Every section has serde defaults so a partial override file is enough.

use onsa_core::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub builtin: BuiltinConfig,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

impl AppConfig {
    /// Whether anything will be registered at startup.
    pub fn has_agents(&self) -> bool {
        self.builtin.echo || !self.peers.is_empty()
    }
}

/// HTTP listener and service identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reported by `GET /`
    #[serde(default = "default_name")]
    pub name: String,
    /// Stamped on server-originated protocol messages
    #[serde(default = "default_sender_id")]
    pub sender_id: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_name() -> String {
    "A2A Protocol Server".to_string()
}

fn default_sender_id() -> String {
    "a2a-server".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_name(),
            sender_id: default_sender_id(),
        }
    }
}

/// Health monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,
    #[serde(default = "default_unhealthy_threshold")]
    pub unhealthy_threshold: u32,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_health_check_interval() -> u64 {
    30
}

fn default_unhealthy_threshold() -> u32 {
    3
}

fn default_probe_timeout() -> u64 {
    10
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            health_check_interval_secs: default_health_check_interval(),
            unhealthy_threshold: default_unhealthy_threshold(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl From<&RegistrySettings> for RegistryConfig {
    fn from(settings: &RegistrySettings) -> Self {
        RegistryConfig::default()
            .with_interval(Duration::from_secs(settings.health_check_interval_secs.max(1)))
            .with_unhealthy_threshold(settings.unhealthy_threshold)
            .with_probe_timeout(Duration::from_secs(settings.probe_timeout_secs.max(1)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

fn default_max_message_bytes() -> usize {
    1024 * 1024
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Enables a daily-rolling log file in this directory
    #[serde(default)]
    pub file_dir: Option<String>,
}

/// Agents hosted in-process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinConfig {
    #[serde(default = "default_true")]
    pub echo: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self { echo: true }
    }
}

/// Agent hosted by another A2A server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Peer base URL
    pub endpoint: String,
    /// Agent id on the peer
    pub agent_id: String,
    /// Id to register under locally; defaults to `agent_id`
    #[serde(default)]
    pub local_id: Option<String>,
}
