//! Monitored agent health.
//!
//! Transitions:
//! - `healthy -> unhealthy` after `threshold` consecutive failed probes
//! - `any -> error` when a probe raises or times out
//! - `any -> healthy` on a single successful probe
//!
//! `error` is reachable from either state; a single successful probe always
//! returns to `healthy`. There is no terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monitored health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Eligible for any-agent dispatch
    Healthy,
    /// Failed the probe `threshold` times in a row
    Unhealthy,
    /// Last probe raised or timed out
    Error,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Probe returned true
    Healthy,
    /// Probe returned false
    Unhealthy,
    /// Probe raised or timed out
    Error(String),
}

/// Per-agent health record, owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Current state
    pub status: HealthStatus,
    /// Time of the most recent probe (or registration)
    pub last_check: DateTime<Utc>,
    /// Failed probes since the last success
    pub consecutive_failures: u32,
}

impl HealthRecord {
    /// Fresh record for a newly registered agent.
    pub fn new() -> Self {
        Self {
            status: HealthStatus::Healthy,
            last_check: Utc::now(),
            consecutive_failures: 0,
        }
    }

    /// Whether the agent may be picked by any-agent dispatch.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Apply a probe outcome. Failures below `unhealthy_threshold` leave the
    /// status untouched.
    pub fn apply(&mut self, outcome: &ProbeOutcome, unhealthy_threshold: u32) {
        match outcome {
            ProbeOutcome::Healthy => {
                self.status = HealthStatus::Healthy;
                self.consecutive_failures = 0;
            }
            ProbeOutcome::Unhealthy => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= unhealthy_threshold {
                    self.status = HealthStatus::Unhealthy;
                }
            }
            ProbeOutcome::Error(_) => {
                self.status = HealthStatus::Error;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            }
        }
        self.last_check = Utc::now();
    }
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self::new()
    }
}
