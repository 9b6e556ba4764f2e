//! Per-agent request counters and registry-wide statistics.

use serde::{Deserialize, Serialize};

/// Running counters for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Recorded requests
    pub requests: u64,
    /// Requests that completed
    pub successes: u64,
    /// Requests that failed
    pub failures: u64,
    /// Wall-clock time across all recorded requests
    pub total_duration_ms: u64,
}

impl AgentMetrics {
    /// Record one request.
    pub fn record(&mut self, success: bool, duration_ms: u64) {
        self.requests += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_duration_ms = self.total_duration_ms.saturating_add(duration_ms);
    }

    /// Mean duration, 0 when nothing has been recorded.
    pub fn average_duration_ms(&self) -> u64 {
        if self.requests == 0 {
            0
        } else {
            self.total_duration_ms / self.requests
        }
    }
}

/// Registry-wide aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Registered agents
    pub total_agents: usize,
    /// Agents whose health status is `healthy`
    pub healthy_agents: usize,
    /// All other agents (`unhealthy` or `error`)
    pub unhealthy_agents: usize,
    /// Sum of per-agent requests
    pub total_requests: u64,
    /// Sum of per-agent successes
    pub total_successes: u64,
    /// Sum of per-agent failures
    pub total_failures: u64,
    /// successes / requests * 100, 0 when there were no requests
    pub success_rate: f64,
}

/// Percentage of successes, 0 when `requests` is 0.
pub fn success_rate(successes: u64, requests: u64) -> f64 {
    if requests == 0 {
        0.0
    } else {
        successes as f64 / requests as f64 * 100.0
    }
}
