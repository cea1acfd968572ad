// ABOUTME: Post-switch health monitoring with automatic rollback.
// ABOUTME: Probes the active environment on an interval and rolls back when thresholds are crossed.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::types::Color;

use super::environment::DeploymentMetrics;
use super::lifecycle::Coordinator;

/// How a monitoring run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The environment stayed within thresholds for the stabilization period.
    Stable,
    /// Thresholds were crossed and traffic was switched back to `to`.
    RolledBack { to: Color },
    /// Thresholds were crossed but the rollback was refused.
    RollbackFailed { reason: String },
    /// Another operation changed the active environment.
    Superseded,
    /// `MonitorHandle::stop` was called.
    Stopped,
}

/// Watches the currently active environment after a switch.
pub struct HealthMonitor {
    coordinator: Arc<Coordinator>,
    config: MonitorConfig,
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    color: Color,
    stop: watch::Sender<bool>,
    task: JoinHandle<MonitorOutcome>,
}

impl HealthMonitor {
    pub fn new(coordinator: Arc<Coordinator>, config: MonitorConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Start monitoring whichever environment is active now.
    pub fn spawn(self) -> MonitorHandle {
        let color = self.coordinator.active_color();
        let (stop, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(color, rx));
        MonitorHandle { color, stop, task }
    }

    async fn run(self, color: Color, mut stop: watch::Receiver<bool>) -> MonitorOutcome {
        info!(
            %color,
            interval = ?self.config.interval,
            period = ?self.config.stabilization_period,
            "monitoring active environment"
        );

        let deadline = Instant::now() + self.config.stabilization_period;
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the switch just verified health.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    info!(%color, "environment stable");
                    return MonitorOutcome::Stable;
                }
                _ = stop.changed() => return MonitorOutcome::Stopped,
            }

            if self.coordinator.active_color() != color {
                debug!(%color, "active environment changed, monitor exiting");
                return MonitorOutcome::Superseded;
            }

            let (report, metrics) = self.coordinator.sample_health(color).await;
            let Some(metrics) = metrics else {
                debug!(%color, "environment restarted or stopped, monitor exiting");
                return MonitorOutcome::Superseded;
            };

            if !report.status.is_healthy() {
                warn!(
                    %color,
                    errors = metrics.error_count,
                    threshold = self.config.max_errors,
                    "health check failed for active environment"
                );
            }

            if should_roll_back(&metrics, &self.config) {
                return self.roll_back(color).await;
            }
        }
    }

    async fn roll_back(&self, color: Color) -> MonitorOutcome {
        warn!(%color, "thresholds exceeded, triggering automatic rollback");

        // The standby's last result may be old; re-check before relying on it.
        self.coordinator.perform_health_check(color.other()).await;

        match self.coordinator.perform_rollback().await {
            Ok(to) => {
                info!(from = %color, %to, "automatic rollback completed");
                MonitorOutcome::RolledBack { to }
            }
            Err(e) => {
                warn!(%color, error = %e, "automatic rollback failed");
                MonitorOutcome::RollbackFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Whether the observed metrics warrant switching back.
pub fn should_roll_back(metrics: &DeploymentMetrics, config: &MonitorConfig) -> bool {
    metrics.error_count >= config.max_errors
        || metrics.mean_response_time() > config.max_response_time
}

impl MonitorHandle {
    /// The environment being monitored.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Wait for the monitor to finish on its own.
    pub async fn wait(self) -> MonitorOutcome {
        let _keep_alive = self.stop;
        self.task.await.unwrap_or_else(|e| MonitorOutcome::RollbackFailed {
            reason: format!("monitor task failed: {e}"),
        })
    }

    /// Cancel monitoring and wait for the task to exit.
    pub async fn stop(self) -> MonitorOutcome {
        let _ = self.stop.send(true);
        self.task.await.unwrap_or(MonitorOutcome::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_millis(10),
            max_errors: 2,
            max_response_time: Duration::from_millis(500),
            stabilization_period: Duration::from_secs(1),
        }
    }

    #[test]
    fn rolls_back_after_error_threshold() {
        let mut metrics = DeploymentMetrics::new();
        metrics.record(Duration::from_millis(5), false);
        assert!(!should_roll_back(&metrics, &config()));
        metrics.record(Duration::from_millis(5), false);
        assert!(should_roll_back(&metrics, &config()));
    }

    #[test]
    fn rolls_back_on_slow_responses() {
        let mut metrics = DeploymentMetrics::new();
        metrics.record(Duration::from_millis(900), true);
        assert!(should_roll_back(&metrics, &config()));
    }

    #[test]
    fn healthy_fast_metrics_do_not_roll_back() {
        let mut metrics = DeploymentMetrics::new();
        metrics.record(Duration::from_millis(20), true);
        metrics.record(Duration::from_millis(30), true);
        assert!(!should_roll_back(&metrics, &config()));
    }
}
