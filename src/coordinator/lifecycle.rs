// ABOUTME: The blue/green deployment coordinator.
// ABOUTME: Starts, stops, health checks, and switches traffic between two environments.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{Color, HealthStatus, Outcome, Status, SwitchKind, Version};

use super::environment::{DeploymentMetrics, EnvironmentSnapshot, EnvironmentState, Slots};
use super::error::CoordinatorError;
use super::health::{HealthProbe, ProbeReport};
use super::history::{DeploymentHistory, HistoryEntry};
use super::server::{Application, ServerHandle};
use super::settings::CoordinatorSettings;

/// What `start_environment` hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub color: Color,
    pub local_addr: SocketAddr,
    pub started_at: DateTime<Utc>,
    pub version: Option<Version>,
    pub health: HealthStatus,
}

#[derive(Debug)]
struct State {
    environments: Slots<EnvironmentState>,
    active: Color,
    history: DeploymentHistory,
}

/// Tracks two deployment environments and which one receives traffic.
///
/// Mutating operations (`start_environment`, `stop_environment`,
/// `switch_environment`, `perform_rollback`) are serialized by an async mutex
/// that also owns the server handles. Observable state sits behind a separate
/// read-write lock, so queries and standalone health checks never wait on a
/// deploy in progress.
pub struct Coordinator {
    settings: CoordinatorSettings,
    probe: HealthProbe,
    servers: Mutex<Slots<Option<ServerHandle>>>,
    state: RwLock<State>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("settings", &self.settings)
            .field("active", &self.state.read().active)
            .finish()
    }
}

impl Coordinator {
    /// Create a coordinator. Blue is the nominal active color until the first switch.
    pub fn new(settings: CoordinatorSettings) -> Result<Self> {
        if settings.blue_port == settings.green_port {
            return Err(Error::InvalidConfig(format!(
                "blue and green must use distinct ports (both are {})",
                settings.blue_port
            )));
        }

        let probe = HealthProbe::from_config(&settings.healthcheck);
        let state = State {
            environments: Slots {
                blue: EnvironmentState::new(Color::Blue, settings.blue_port),
                green: EnvironmentState::new(Color::Green, settings.green_port),
            },
            active: Color::Blue,
            history: DeploymentHistory::default(),
        };

        Ok(Self {
            settings,
            probe,
            servers: Mutex::new(Slots {
                blue: None,
                green: None,
            }),
            state: RwLock::new(state),
        })
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bind `app` to the color's port and run one health check against it.
    ///
    /// A failed health check does not undo the start; the environment stays
    /// up and is marked unhealthy.
    pub async fn start_environment(
        &self,
        app: Arc<dyn Application>,
        color: Color,
        version: Option<Version>,
    ) -> std::result::Result<ServerInfo, CoordinatorError> {
        let mut servers = self.servers.lock().await;
        let port = self.settings.port(color);

        if servers.get(color).is_some() {
            return Err(CoordinatorError::AlreadyRunning { color, port });
        }

        let addr = SocketAddr::new(self.settings.bind_address, port);
        let handle = ServerHandle::bind(app, addr)
            .await
            .map_err(|source| CoordinatorError::ProcessStart {
                color,
                port,
                source,
            })?;

        let local_addr = handle.local_addr();
        let started_at = handle.started_at();
        let generation = {
            let mut state = self.state.write();
            let env = state.environments.get_mut(color);
            env.generation += 1;
            env.local_addr = Some(local_addr);
            env.last_deployment = Some(started_at);
            env.version = version.clone();
            env.health = HealthStatus::Unknown;
            env.metrics = DeploymentMetrics::new();
            env.generation
        };
        *servers.get_mut(color) = Some(handle);

        info!(
            %color,
            %local_addr,
            version = version.as_ref().map(Version::as_str),
            "environment started"
        );

        let report = self.probe_port(color).await;
        let health = self.apply_probe(color, generation, &report, false);
        drop(servers);

        Ok(ServerInfo {
            color,
            local_addr,
            started_at,
            version,
            health,
        })
    }

    /// Gracefully stop the color's server. Stopping a stopped environment is a no-op.
    ///
    /// If draining fails or times out the handle is kept, so the
    /// environment may still be serving; calling stop again resumes waiting.
    pub async fn stop_environment(
        &self,
        color: Color,
    ) -> std::result::Result<(), CoordinatorError> {
        let mut servers = self.servers.lock().await;

        let Some(handle) = servers.get_mut(color) else {
            debug!(%color, "environment already stopped");
            return Ok(());
        };

        if self.state.read().environments.get(color).status == Status::Active {
            warn!(
                %color,
                "stopping the active environment; no environment will serve traffic until the next switch"
            );
        }

        handle
            .shutdown(self.settings.shutdown_timeout)
            .await
            .map_err(|source| CoordinatorError::GracefulShutdown { color, source })?;
        *servers.get_mut(color) = None;

        {
            let mut state = self.state.write();
            let env = state.environments.get_mut(color);
            env.generation += 1;
            env.local_addr = None;
            env.status = Status::Inactive;
            env.health = HealthStatus::Unknown;
        }

        info!(%color, "environment stopped");
        Ok(())
    }

    /// Stop both environments, inactive first.
    pub async fn stop_all(&self) -> std::result::Result<(), CoordinatorError> {
        let active = self.active_color();
        self.stop_environment(active.other()).await?;
        self.stop_environment(active).await
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Probe the color's health endpoint and record the result.
    ///
    /// Never fails. Has no effect on status or traffic. The result is dropped
    /// if the environment was restarted or stopped while the probe was in flight.
    pub async fn perform_health_check(&self, color: Color) -> HealthStatus {
        let generation = self.state.read().environments.get(color).generation;
        let report = self.probe_port(color).await;
        self.apply_probe(color, generation, &report, false)
    }

    /// Probe both environments concurrently.
    pub async fn perform_health_checks(&self) -> (HealthStatus, HealthStatus) {
        futures::future::join(
            self.perform_health_check(Color::Blue),
            self.perform_health_check(Color::Green),
        )
        .await
    }

    /// Probe for the monitor: also feeds the environment's metrics.
    pub(crate) async fn sample_health(
        &self,
        color: Color,
    ) -> (ProbeReport, Option<DeploymentMetrics>) {
        let generation = self.state.read().environments.get(color).generation;
        let report = self.probe_port(color).await;
        self.apply_probe(color, generation, &report, true);

        let state = self.state.read();
        let env = state.environments.get(color);
        let metrics = (env.generation == generation).then(|| env.metrics.clone());
        (report, metrics)
    }

    async fn probe_port(&self, color: Color) -> ProbeReport {
        let port = self.state.read().environments.get(color).probe_port();
        self.probe.probe(port).await
    }

    fn apply_probe(
        &self,
        color: Color,
        generation: u64,
        report: &ProbeReport,
        track_metrics: bool,
    ) -> HealthStatus {
        let mut state = self.state.write();
        let env = state.environments.get_mut(color);

        if env.generation != generation {
            debug!(
                %color,
                issued = generation,
                current = env.generation,
                "discarding stale health result"
            );
            return report.status;
        }

        if env.health != report.status {
            info!(
                %color,
                from = %env.health,
                to = %report.status,
                http_status = report.http_status,
                "health changed"
            );
        }
        env.health = report.status;

        if track_metrics {
            env.metrics.record(report.elapsed, report.status.is_healthy());
        }

        report.status
    }

    // =========================================================================
    // Traffic switching
    // =========================================================================

    /// Make the inactive environment active. Refused unless it is running and healthy.
    ///
    /// Only bookkeeping changes; routers consult `active_environment()`.
    pub async fn switch_environment(&self) -> std::result::Result<Color, CoordinatorError> {
        let servers = self.servers.lock().await;
        self.switch_locked(&servers, SwitchKind::Switch)
    }

    /// Switch back to the previously active environment.
    ///
    /// Fails with `NoPreviousDeployment` if that environment was never
    /// started, `TargetNotRunning` if it has been stopped since, or
    /// `UnhealthyTarget` if it is not currently healthy.
    pub async fn perform_rollback(&self) -> std::result::Result<Color, CoordinatorError> {
        let servers = self.servers.lock().await;

        {
            let mut state = self.state.write();
            let target = state.active.other();
            let env = state.environments.get(target);
            if env.last_deployment.is_none() {
                state.history.record(SwitchKind::Rollback, target, None, Outcome::Failed);
                warn!(%target, "rollback refused: no previous deployment");
                return Err(CoordinatorError::NoPreviousDeployment { color: target });
            }
        }

        self.switch_locked(&servers, SwitchKind::Rollback)
    }

    /// Takes the locked server slots so the running check and the flip are atomic.
    fn switch_locked(
        &self,
        servers: &Slots<Option<ServerHandle>>,
        kind: SwitchKind,
    ) -> std::result::Result<Color, CoordinatorError> {
        let mut state = self.state.write();
        let from = state.active;
        let target = from.other();
        let target_env = state.environments.get(target);
        let health = target_env.health;
        let version = target_env.version.clone();

        // A stopped environment's fixed port may be answered by something else.
        if servers.get(target).is_none() {
            state.history.record(kind, target, version, Outcome::Failed);
            warn!(%kind, %target, "switch refused: target is not running");
            return Err(CoordinatorError::TargetNotRunning { color: target });
        }

        if !health.is_healthy() {
            state.history.record(kind, target, version, Outcome::Failed);
            warn!(%kind, %target, %health, "switch refused: target is not healthy");
            return Err(CoordinatorError::UnhealthyTarget {
                color: target,
                health,
            });
        }

        state.environments.get_mut(target).status = Status::Active;
        state.environments.get_mut(from).status = Status::Inactive;
        state.active = target;
        state.history.record(kind, target, version.clone(), Outcome::Success);

        info!(
            %kind,
            %from,
            to = %target,
            version = version.as_ref().map(Version::as_str),
            "traffic switched"
        );
        Ok(target)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The color traffic should be routed to.
    pub fn active_color(&self) -> Color {
        self.state.read().active
    }

    pub fn active_environment(&self) -> EnvironmentSnapshot {
        let state = self.state.read();
        state.environments.get(state.active).snapshot()
    }

    pub fn inactive_environment(&self) -> EnvironmentSnapshot {
        let state = self.state.read();
        state.environments.get(state.active.other()).snapshot()
    }

    pub fn environment(&self, color: Color) -> EnvironmentSnapshot {
        self.state.read().environments.get(color).snapshot()
    }

    /// Port that should receive traffic, if the active environment is serving.
    pub fn active_port(&self) -> Option<u16> {
        let env = self.active_environment();
        (env.status == Status::Active && env.running).then_some(env.port)
    }

    pub fn deployment_history(&self) -> Vec<HistoryEntry> {
        self.state.read().history.entries().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_identical_ports() {
        let err = Coordinator::new(CoordinatorSettings::new(5001, 5001)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn starts_with_both_environments_inactive() {
        let coordinator = Coordinator::new(CoordinatorSettings::new(5001, 5002)).unwrap();
        assert_eq!(coordinator.active_color(), Color::Blue);
        assert_eq!(coordinator.active_environment().status, Status::Inactive);
        assert_eq!(coordinator.inactive_environment().color, Color::Green);
        assert_eq!(coordinator.environment(Color::Green).port, 5002);
        assert!(coordinator.active_port().is_none());
        assert!(coordinator.deployment_history().is_empty());
    }

    #[tokio::test]
    async fn stopping_a_stopped_environment_is_a_no_op() {
        let coordinator = Coordinator::new(CoordinatorSettings::new(5001, 5002)).unwrap();
        coordinator.stop_environment(Color::Blue).await.unwrap();
        coordinator.stop_environment(Color::Blue).await.unwrap();
        assert_eq!(
            coordinator.environment(Color::Blue),
            Coordinator::new(CoordinatorSettings::new(5001, 5002))
                .unwrap()
                .environment(Color::Blue)
        );
    }

    #[tokio::test]
    async fn switch_to_stopped_environment_is_refused_and_recorded() {
        let coordinator = Coordinator::new(CoordinatorSettings::new(5001, 5002)).unwrap();
        let err = coordinator.switch_environment().await.unwrap_err();

        assert!(matches!(
            err,
            CoordinatorError::TargetNotRunning {
                color: Color::Green
            }
        ));
        let history = coordinator.deployment_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, Outcome::Failed);
        assert_eq!(coordinator.active_color(), Color::Blue);
    }

    #[test]
    fn stale_health_results_are_discarded() {
        let coordinator = Coordinator::new(CoordinatorSettings::new(5001, 5002)).unwrap();
        let report = ProbeReport {
            status: HealthStatus::Healthy,
            http_status: Some(200),
            elapsed: std::time::Duration::from_millis(1),
        };

        let status = coordinator.apply_probe(Color::Green, 7, &report, false);
        assert_eq!(status, HealthStatus::Healthy);
        assert_eq!(
            coordinator.environment(Color::Green).health,
            HealthStatus::Unknown
        );

        coordinator.apply_probe(Color::Green, 0, &report, true);
        let green = coordinator.environment(Color::Green);
        assert_eq!(green.health, HealthStatus::Healthy);
        assert_eq!(green.error_count, 0);
    }

    #[tokio::test]
    async fn rollback_without_previous_deployment_is_refused() {
        let coordinator = Coordinator::new(CoordinatorSettings::new(5001, 5002)).unwrap();
        let err = coordinator.perform_rollback().await.unwrap_err();

        assert!(matches!(
            err,
            CoordinatorError::NoPreviousDeployment { color: Color::Green }
        ));
        let history = coordinator.deployment_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, SwitchKind::Rollback);
        assert_eq!(history[0].outcome, Outcome::Failed);
    }
}
