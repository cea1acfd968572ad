// ABOUTME: Blue/green deployment coordination.
// ABOUTME: Exports the coordinator, server handles, health probe, monitor, and deploy flow.

mod environment;
mod error;
mod health;
mod history;
mod lifecycle;
mod monitor;
mod rollout;
mod server;
mod settings;

pub use environment::{DeploymentMetrics, EnvironmentSnapshot};
pub use error::{CoordinatorError, CoordinatorErrorKind};
pub use health::{HealthProbe, ProbeReport};
pub use history::HistoryEntry;
pub use lifecycle::{Coordinator, ServerInfo};
pub use monitor::{HealthMonitor, MonitorHandle, MonitorOutcome, should_roll_back};
pub use rollout::{DeployReport, RolloutPolicy, deploy, teardown};
pub use server::{Application, HealthControl, ServerError, ServerHandle, StaticApp};
pub use settings::CoordinatorSettings;
