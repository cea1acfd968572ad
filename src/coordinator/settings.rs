// ABOUTME: Construction parameters for a Coordinator.
// ABOUTME: Fixed per-color ports, bind address, probe, and shutdown bounds.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::config::{Config, HealthcheckConfig};
use crate::types::Color;

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub blue_port: u16,
    pub green_port: u16,
    pub bind_address: IpAddr,
    pub healthcheck: HealthcheckConfig,
    pub shutdown_timeout: Option<Duration>,
}

impl CoordinatorSettings {
    /// Settings with default probe parameters, bound to loopback.
    pub fn new(blue_port: u16, green_port: u16) -> Self {
        Self {
            blue_port,
            green_port,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            healthcheck: HealthcheckConfig::default(),
            shutdown_timeout: None,
        }
    }

    pub fn healthcheck(mut self, healthcheck: HealthcheckConfig) -> Self {
        self.healthcheck = healthcheck;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    pub fn port(&self, color: Color) -> u16 {
        match color {
            Color::Blue => self.blue_port,
            Color::Green => self.green_port,
        }
    }
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            blue_port: config.blue_port,
            green_port: config.green_port,
            bind_address: config.bind_address,
            healthcheck: config.healthcheck.clone(),
            shutdown_timeout: config.shutdown.timeout,
        }
    }
}
