// ABOUTME: Post-switch health monitoring configuration.
// ABOUTME: Thresholds that trigger an automatic rollback of the active environment.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Failed probes before rolling back.
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,

    /// Mean probe latency above which the deployment is rolled back.
    #[serde(default = "default_max_response_time", with = "humantime_serde")]
    pub max_response_time: Duration,

    /// How long the new environment must stay within thresholds to be considered stable.
    #[serde(default = "default_stabilization_period", with = "humantime_serde")]
    pub stabilization_period: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_errors() -> u32 {
    3
}

fn default_max_response_time() -> Duration {
    Duration::from_secs(2)
}

fn default_stabilization_period() -> Duration {
    Duration::from_secs(30)
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            interval: default_interval(),
            max_errors: default_max_errors(),
            max_response_time: default_max_response_time(),
            stabilization_period: default_stabilization_period(),
        }
    }
}
