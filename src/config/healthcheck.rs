// ABOUTME: HTTP health check configuration.
// ABOUTME: Probe target, timeout, and retry parameters with sensible defaults.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthcheckConfig {
    #[serde(default = "default_path")]
    pub path: String,

    /// Address the probe connects to; environments are probed on their own port.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Probe attempts during a deploy before giving up.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_path() -> String {
    "/health".to_string()
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_retries() -> u32 {
    5
}

fn default_interval() -> Duration {
    Duration::from_secs(2)
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        HealthcheckConfig {
            path: default_path(),
            host: default_host(),
            timeout: default_timeout(),
            retries: default_retries(),
            interval: default_interval(),
        }
    }
}
