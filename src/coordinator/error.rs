// ABOUTME: Error types for coordinator operations.
// ABOUTME: Covers start, stop, switch, and rollback failures.

use crate::types::{Color, HealthStatus};

use super::server::ServerError;

/// Errors that can occur while coordinating blue/green environments.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Start requested for an environment that already has a running server.
    #[error("{color} environment is already running on port {port}")]
    AlreadyRunning { color: Color, port: u16 },

    /// Switch or rollback target is not healthy.
    #[error("cannot switch to {color} environment: health is {health}")]
    UnhealthyTarget { color: Color, health: HealthStatus },

    /// Binding or starting the server failed.
    #[error("failed to start {color} environment on port {port}: {source}")]
    ProcessStart {
        color: Color,
        port: u16,
        #[source]
        source: ServerError,
    },

    /// Switch or rollback target has no running server.
    #[error("cannot switch to {color} environment: it is not running")]
    TargetNotRunning { color: Color },

    /// Graceful close failed or timed out. The server may still be running.
    #[error("failed to stop {color} environment: {source}")]
    GracefulShutdown {
        color: Color,
        #[source]
        source: ServerError,
    },

    /// Rollback target has never been deployed.
    #[error("no previous deployment available for rollback ({color} was never deployed)")]
    NoPreviousDeployment { color: Color },

    /// The deploy flow gave up waiting for the target to become healthy.
    #[error("{color} environment failed {attempts} health check attempt(s)")]
    HealthCheckExhausted { color: Color, attempts: u32 },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorErrorKind {
    AlreadyRunning,
    UnhealthyTarget,
    TargetNotRunning,
    ProcessStart,
    GracefulShutdown,
    NoPreviousDeployment,
    HealthCheckExhausted,
}

impl CoordinatorError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> CoordinatorErrorKind {
        match self {
            CoordinatorError::AlreadyRunning { .. } => CoordinatorErrorKind::AlreadyRunning,
            CoordinatorError::UnhealthyTarget { .. } => CoordinatorErrorKind::UnhealthyTarget,
            CoordinatorError::TargetNotRunning { .. } => CoordinatorErrorKind::TargetNotRunning,
            CoordinatorError::ProcessStart { .. } => CoordinatorErrorKind::ProcessStart,
            CoordinatorError::GracefulShutdown { .. } => CoordinatorErrorKind::GracefulShutdown,
            CoordinatorError::NoPreviousDeployment { .. } => {
                CoordinatorErrorKind::NoPreviousDeployment
            }
            CoordinatorError::HealthCheckExhausted { .. } => {
                CoordinatorErrorKind::HealthCheckExhausted
            }
        }
    }

    /// The environment the error refers to.
    pub fn color(&self) -> Color {
        match self {
            CoordinatorError::AlreadyRunning { color, .. }
            | CoordinatorError::UnhealthyTarget { color, .. }
            | CoordinatorError::TargetNotRunning { color }
            | CoordinatorError::ProcessStart { color, .. }
            | CoordinatorError::GracefulShutdown { color, .. }
            | CoordinatorError::NoPreviousDeployment { color }
            | CoordinatorError::HealthCheckExhausted { color, .. } => *color,
        }
    }
}
