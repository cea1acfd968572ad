// ABOUTME: Per-environment bookkeeping for the coordinator.
// ABOUTME: Mutable slot state, monitoring metrics, and read-only snapshots.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Color, HealthStatus, Status, Version};

/// Response-time samples kept for the rolling mean.
const MAX_SAMPLES: usize = 100;

/// Probe statistics gathered while an environment is monitored.
#[derive(Debug, Clone)]
pub struct DeploymentMetrics {
    pub started_at: DateTime<Utc>,
    pub error_count: u32,
    response_times: VecDeque<Duration>,
}

impl DeploymentMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            error_count: 0,
            response_times: VecDeque::new(),
        }
    }

    pub fn record(&mut self, elapsed: Duration, healthy: bool) {
        if self.response_times.len() == MAX_SAMPLES {
            self.response_times.pop_front();
        }
        self.response_times.push_back(elapsed);
        if !healthy {
            self.error_count += 1;
        }
    }

    pub fn samples(&self) -> usize {
        self.response_times.len()
    }

    /// Mean of the recorded response times, zero when nothing was recorded.
    pub fn mean_response_time(&self) -> Duration {
        if self.response_times.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.response_times.iter().sum();
        total / self.response_times.len() as u32
    }
}

impl Default for DeploymentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state of one slot, owned by the coordinator.
#[derive(Debug)]
pub(crate) struct EnvironmentState {
    pub color: Color,
    pub port: u16,
    pub status: Status,
    pub health: HealthStatus,
    pub last_deployment: Option<DateTime<Utc>>,
    pub version: Option<Version>,
    pub local_addr: Option<SocketAddr>,
    /// Bumped on every start and stop; health results from an older generation are dropped.
    pub generation: u64,
    pub metrics: DeploymentMetrics,
}

impl EnvironmentState {
    pub fn new(color: Color, port: u16) -> Self {
        Self {
            color,
            port,
            status: Status::Inactive,
            health: HealthStatus::Unknown,
            last_deployment: None,
            version: None,
            local_addr: None,
            generation: 0,
            metrics: DeploymentMetrics::new(),
        }
    }

    /// Port the health probe should target.
    pub fn probe_port(&self) -> u16 {
        self.local_addr.map(|a| a.port()).unwrap_or(self.port)
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            color: self.color,
            port: self.port,
            status: self.status,
            health: self.health,
            running: self.local_addr.is_some(),
            last_deployment: self.last_deployment,
            version: self.version.clone(),
            error_count: self.metrics.error_count,
            mean_response_time_ms: self.metrics.mean_response_time().as_millis() as u64,
        }
    }
}

/// A copy of an environment's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSnapshot {
    pub color: Color,
    pub port: u16,
    pub status: Status,
    pub health: HealthStatus,
    pub running: bool,
    pub last_deployment: Option<DateTime<Utc>>,
    pub version: Option<Version>,
    pub error_count: u32,
    pub mean_response_time_ms: u64,
}

/// A value per color.
#[derive(Debug)]
pub(crate) struct Slots<T> {
    pub blue: T,
    pub green: T,
}

impl<T> Slots<T> {
    pub fn get(&self, color: Color) -> &T {
        match color {
            Color::Blue => &self.blue,
            Color::Green => &self.green,
        }
    }

    pub fn get_mut(&mut self, color: Color) -> &mut T {
        match color {
            Color::Blue => &mut self.blue,
            Color::Green => &mut self.green,
        }
    }
}
