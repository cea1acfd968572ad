// ABOUTME: End-to-end deploy flow on top of the coordinator.
// ABOUTME: Starts the standby color, waits for health, switches, and retires the old color.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::HealthcheckConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::{Color, Version};

use super::error::CoordinatorError;
use super::lifecycle::Coordinator;
use super::server::Application;

/// How a deploy waits for health and what it does with the old color.
#[derive(Debug, Clone)]
pub struct RolloutPolicy {
    /// Health check attempts, counting the one made right after start.
    pub attempts: u32,
    pub interval: Duration,
    /// Stop the previously active environment after a successful switch.
    pub stop_previous: bool,
}

impl RolloutPolicy {
    pub fn from_config(config: &HealthcheckConfig) -> Self {
        Self {
            attempts: config.retries.max(1),
            interval: config.interval,
            stop_previous: true,
        }
    }

    pub fn keep_previous(mut self) -> Self {
        self.stop_previous = false;
        self
    }
}

/// Summary of a successful deploy.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub color: Color,
    pub previous: Color,
    pub version: Version,
    pub attempts: u32,
    pub previous_stopped: bool,
}

/// Deploy `app` into the inactive color and switch traffic to it.
///
/// If the target never turns healthy it is stopped again and the active
/// environment is left untouched.
pub async fn deploy(
    coordinator: &Coordinator,
    app: Arc<dyn Application>,
    version: Version,
    policy: &RolloutPolicy,
    diag: &mut Diagnostics,
) -> Result<DeployReport, CoordinatorError> {
    let previous = coordinator.active_color();
    let target = previous.other();
    info!(%target, %version, "starting deployment");

    let started = coordinator
        .start_environment(app, target, Some(version.clone()))
        .await?;

    let mut health = started.health;
    let mut attempts = 1;
    while !health.is_healthy() && attempts < policy.attempts {
        info!(%target, attempt = attempts + 1, of = policy.attempts, "waiting for health");
        tokio::time::sleep(policy.interval).await;
        health = coordinator.perform_health_check(target).await;
        attempts += 1;
    }

    if !health.is_healthy() {
        if let Err(e) = coordinator.stop_environment(target).await {
            diag.warn(Warning::target_cleanup(
                target,
                format!("failed to stop unhealthy {target} environment: {e}"),
            ));
        }
        return Err(CoordinatorError::HealthCheckExhausted {
            color: target,
            attempts,
        });
    }

    coordinator.switch_environment().await?;

    let mut previous_stopped = false;
    if policy.stop_previous {
        match coordinator.stop_environment(previous).await {
            Ok(()) => previous_stopped = true,
            Err(e) => diag.warn(Warning::previous_stop(
                previous,
                format!("failed to stop previous {previous} environment: {e}"),
            )),
        }
    }

    info!(color = %target, %previous, attempts, "deployment complete");
    Ok(DeployReport {
        color: target,
        previous,
        version,
        attempts,
        previous_stopped,
    })
}

/// Stop both environments without failing, inactive first.
///
/// Used on error paths where the original failure must survive; each
/// environment that cannot be stopped becomes a warning instead.
pub async fn teardown(coordinator: &Coordinator, diag: &mut Diagnostics) {
    let active = coordinator.active_color();
    for color in [active.other(), active] {
        if let Err(e) = coordinator.stop_environment(color).await {
            diag.warn(Warning::teardown(
                color,
                format!("failed to stop {color} environment: {e}"),
            ));
        }
    }
}
