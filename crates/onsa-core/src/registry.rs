//! Agent Registry
//!
//! Single source of truth for which agents exist, what they can do, whether
//! they are healthy and how they have performed. All mutation of that state
//! goes through the methods here; the dispatcher and transports only read.
//!
//! The registry also owns the health monitor: a background loop started with
//! [`AgentRegistry::start`] that probes every agent with a handle on a fixed
//! interval and feeds the outcome into its [`HealthRecord`].

use futures::future::join_all;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::AgentHandle;
use crate::error::{Error, Result};
use crate::health::{HealthRecord, ProbeOutcome};
use crate::metrics::{success_rate, AgentMetrics, RegistryStats};
use crate::protocol::{AgentDescriptor, AgentStatus};

/// Health monitor tuning.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Delay between probe cycles
    pub health_check_interval: Duration,
    /// Consecutive failed probes before an agent is marked unhealthy
    pub unhealthy_threshold: u32,
    /// Upper bound for a single probe; exceeding it counts as a probe error
    pub probe_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(30),
            unhealthy_threshold: 3,
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    /// Set the probe interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Set the unhealthy threshold (clamped to at least 1)
    pub fn with_unhealthy_threshold(mut self, threshold: u32) -> Self {
        self.unhealthy_threshold = threshold.max(1);
        self
    }

    /// Set the per-probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

struct AgentEntry {
    descriptor: AgentDescriptor,
    handle: Option<AgentHandle>,
    health: HealthRecord,
    /// Bumped on every (re-)registration so in-flight probe results for a
    /// replaced entry can be told apart.
    generation: u64,
}

#[derive(Default)]
struct RegistryState {
    agents: HashMap<String, AgentEntry>,
    /// Registration order; drives iteration everywhere.
    order: Vec<String>,
    metrics: HashMap<String, AgentMetrics>,
    next_generation: u64,
}

impl RegistryState {
    fn entries(&self) -> impl Iterator<Item = &AgentEntry> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }
}

struct Monitor {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry of capability providers.
pub struct AgentRegistry {
    config: RegistryConfig,
    state: RwLock<RegistryState>,
    monitor: Mutex<Option<Monitor>>,
}

impl AgentRegistry {
    /// Create an empty registry with default monitor settings.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            state: RwLock::new(RegistryState::default()),
            monitor: Mutex::new(None),
        }
    }

    /// Monitor settings in effect.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Insert or replace the agent under `descriptor.agent_id`.
    ///
    /// A replaced agent keeps its position and its metrics; its health record
    /// starts over as healthy. Repeated capability names collapse into one.
    pub async fn register(
        &self,
        mut descriptor: AgentDescriptor,
        handle: Option<AgentHandle>,
    ) -> String {
        let agent_id = descriptor.agent_id.clone();
        let dropped = descriptor.dedup_capabilities();
        if dropped > 0 {
            warn!(agent_id = %agent_id, dropped, "Collapsed duplicate capabilities");
        }
        let mut state = self.state.write().await;

        state.next_generation += 1;
        let generation = state.next_generation;
        let entry = AgentEntry {
            descriptor,
            handle,
            health: HealthRecord::new(),
            generation,
        };

        if state.agents.insert(agent_id.clone(), entry).is_some() {
            info!(agent_id = %agent_id, "Re-registered agent");
        } else {
            state.order.push(agent_id.clone());
            info!(agent_id = %agent_id, "Registered agent");
        }

        agent_id
    }

    /// Remove the agent with its handle, health record and metrics.
    ///
    /// Returns false when the id was not registered.
    pub async fn unregister(&self, agent_id: &str) -> bool {
        let mut state = self.state.write().await;
        if state.agents.remove(agent_id).is_none() {
            return false;
        }
        state.order.retain(|id| id != agent_id);
        state.metrics.remove(agent_id);
        info!(agent_id = %agent_id, "Unregistered agent");
        true
    }

    /// Descriptor for `agent_id`.
    pub async fn lookup(&self, agent_id: &str) -> Option<AgentDescriptor> {
        let state = self.state.read().await;
        state.agents.get(agent_id).map(|e| e.descriptor.clone())
    }

    /// Invocable handle for `agent_id`, if one was registered.
    pub async fn get_handle(&self, agent_id: &str) -> Option<AgentHandle> {
        let state = self.state.read().await;
        state.agents.get(agent_id).and_then(|e| e.handle.clone())
    }

    /// Descriptors matching both filters, in registration order.
    pub async fn list(
        &self,
        status: Option<AgentStatus>,
        capability: Option<&str>,
    ) -> Vec<AgentDescriptor> {
        let state = self.state.read().await;
        state
            .entries()
            .filter(|e| status.map_or(true, |s| e.descriptor.status == s))
            .filter(|e| capability.map_or(true, |c| e.descriptor.has_capability(c)))
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Every agent advertising `capability` (exact, case-sensitive match),
    /// healthy or not, in registration order.
    pub async fn find_by_capability(&self, capability: &str) -> Vec<AgentDescriptor> {
        self.list(None, Some(capability)).await
    }

    /// Current health record.
    pub async fn agent_health(&self, agent_id: &str) -> Option<HealthRecord> {
        let state = self.state.read().await;
        state.agents.get(agent_id).map(|e| e.health.clone())
    }

    /// Metrics for a registered agent; zeroed if nothing was recorded yet.
    pub async fn agent_metrics(&self, agent_id: &str) -> Option<AgentMetrics> {
        let state = self.state.read().await;
        if !state.agents.contains_key(agent_id) {
            return None;
        }
        Some(state.metrics.get(agent_id).copied().unwrap_or_default())
    }

    /// Descriptor and metrics of every agent, in registration order.
    pub async fn all_metrics(&self) -> Vec<(AgentDescriptor, AgentMetrics)> {
        let state = self.state.read().await;
        state
            .entries()
            .map(|e| {
                let metrics = state
                    .metrics
                    .get(&e.descriptor.agent_id)
                    .copied()
                    .unwrap_or_default();
                (e.descriptor.clone(), metrics)
            })
            .collect()
    }

    /// Record one invocation. Silently ignored for unknown agents.
    pub async fn record_request(&self, agent_id: &str, success: bool, duration_ms: u64) {
        let mut state = self.state.write().await;
        if !state.agents.contains_key(agent_id) {
            debug!(agent_id = %agent_id, "Dropping metric for unregistered agent");
            return;
        }
        state
            .metrics
            .entry(agent_id.to_string())
            .or_default()
            .record(success, duration_ms);
    }

    /// Registry-wide aggregate.
    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        let total_agents = state.agents.len();
        let healthy_agents = state.agents.values().filter(|e| e.health.is_healthy()).count();

        let (requests, successes, failures) = state
            .metrics
            .values()
            .fold((0u64, 0u64, 0u64), |(r, s, f), m| {
                (r + m.requests, s + m.successes, f + m.failures)
            });

        RegistryStats {
            total_agents,
            healthy_agents,
            unhealthy_agents: total_agents - healthy_agents,
            total_requests: requests,
            total_successes: successes,
            total_failures: failures,
            success_rate: success_rate(successes, requests),
        }
    }

    /// First healthy provider of `capability`, with its handle.
    ///
    /// Selection never suspends while holding the lock, so one call sees a
    /// consistent view of descriptors and health.
    pub(crate) async fn select_healthy(
        &self,
        capability: &str,
    ) -> Result<(AgentDescriptor, Option<AgentHandle>)> {
        let state = self.state.read().await;
        let mut candidates = state
            .entries()
            .filter(|e| e.descriptor.has_capability(capability))
            .peekable();

        if candidates.peek().is_none() {
            return Err(Error::CapabilityNotFound(capability.to_string()));
        }

        candidates
            .find(|e| e.health.is_healthy())
            .map(|e| (e.descriptor.clone(), e.handle.clone()))
            .ok_or_else(|| Error::NoHealthyAgent(capability.to_string()))
    }

    /// Run one probe cycle over every agent that has a handle.
    ///
    /// Probes run concurrently, each bounded by the probe timeout. A probe
    /// that errors, panics or times out only affects its own agent.
    pub async fn run_health_checks(&self) {
        let targets: Vec<(String, AgentHandle, u64)> = {
            let state = self.state.read().await;
            state
                .entries()
                .filter_map(|e| {
                    e.handle
                        .clone()
                        .map(|h| (e.descriptor.agent_id.clone(), h, e.generation))
                })
                .collect()
        };

        if targets.is_empty() {
            return;
        }

        let timeout = self.config.probe_timeout;
        let probes = targets.into_iter().map(|(agent_id, handle, generation)| async move {
            let probe = AssertUnwindSafe(handle.health_check()).catch_unwind();
            let outcome = match tokio::time::timeout(timeout, probe).await {
                Ok(Ok(Ok(true))) => ProbeOutcome::Healthy,
                Ok(Ok(Ok(false))) => ProbeOutcome::Unhealthy,
                Ok(Ok(Err(e))) => ProbeOutcome::Error(e.to_string()),
                Ok(Err(_)) => ProbeOutcome::Error("health probe panicked".to_string()),
                Err(_) => ProbeOutcome::Error(format!(
                    "health probe timed out after {}ms",
                    timeout.as_millis()
                )),
            };
            (agent_id, generation, outcome)
        });
        let results = join_all(probes).await;

        let threshold = self.config.unhealthy_threshold;
        let mut state = self.state.write().await;
        for (agent_id, generation, outcome) in results {
            let Some(entry) = state
                .agents
                .get_mut(&agent_id)
                .filter(|e| e.generation == generation)
            else {
                debug!(agent_id = %agent_id, "Discarding probe result for replaced agent");
                continue;
            };

            let previous = entry.health.status;
            entry.health.apply(&outcome, threshold);
            let current = entry.health.status;

            if let ProbeOutcome::Error(reason) = &outcome {
                warn!(agent_id = %agent_id, error = %reason, "Health probe failed");
            }
            if previous != current {
                info!(
                    agent_id = %agent_id,
                    from = %previous,
                    to = %current,
                    failures = entry.health.consecutive_failures,
                    "Agent health changed"
                );
            }
        }
    }

    /// Start the health monitor. No-op if it is already running.
    pub async fn start(self: &Arc<Self>) {
        let mut monitor = self.monitor.lock().await;
        if monitor.is_some() {
            debug!("Health monitor already running");
            return;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(monitor_loop(
            Arc::downgrade(self),
            self.config.health_check_interval,
            token.clone(),
        ));
        *monitor = Some(Monitor { token, handle });

        info!(
            interval_secs = self.config.health_check_interval.as_secs(),
            threshold = self.config.unhealthy_threshold,
            "Health monitor started"
        );
    }

    /// Cancel the health monitor and wait for it to exit.
    pub async fn stop(&self) {
        let Some(Monitor { token, handle }) = self.monitor.lock().await.take() else {
            return;
        };
        token.cancel();
        if let Err(e) = handle.await {
            warn!(error = %e, "Health monitor terminated abnormally");
        }
        info!("Health monitor stopped");
    }

    /// Whether the health monitor is running.
    pub async fn is_running(&self) -> bool {
        self.monitor.lock().await.is_some()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn monitor_loop(registry: Weak<AgentRegistry>, interval: Duration, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let Some(registry) = registry.upgrade() else {
            break;
        };

        // dropping the cycle drops every probe still in flight
        tokio::select! {
            _ = token.cancelled() => break,
            _ = registry.run_health_checks() => {}
        }
    }
    debug!("Health monitor loop exited");
}
