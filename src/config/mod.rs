// ABOUTME: Configuration types and parsing for bluegreen.yml.
// ABOUTME: Handles YAML parsing, environment overrides, and validation.

mod healthcheck;
mod init;
mod monitor;
mod shutdown;

pub use healthcheck::HealthcheckConfig;
pub use init::init_config;
pub use monitor::MonitorConfig;
pub use shutdown::ShutdownConfig;

use crate::error::{Error, Result};
use crate::types::Color;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

pub const CONFIG_FILENAME: &str = "bluegreen.yml";
pub const CONFIG_FILENAME_ALT: &str = "bluegreen.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".bluegreen/config.yml";

pub const ENV_BLUE_PORT: &str = "BLUEGREEN_BLUE_PORT";
pub const ENV_GREEN_PORT: &str = "BLUEGREEN_GREEN_PORT";
pub const ENV_BIND_ADDRESS: &str = "BLUEGREEN_BIND_ADDRESS";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_blue_port")]
    pub blue_port: u16,

    #[serde(default = "default_green_port")]
    pub green_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    #[serde(default)]
    pub healthcheck: HealthcheckConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

fn default_blue_port() -> u16 {
    5001
}

fn default_green_port() -> u16 {
    5002
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

impl Default for Config {
    fn default() -> Self {
        Self::template()
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Apply port and bind address overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(port) = env_override::<u16>(ENV_BLUE_PORT)? {
            self.blue_port = port;
        }
        if let Some(port) = env_override::<u16>(ENV_GREEN_PORT)? {
            self.green_port = port;
        }
        if let Some(addr) = env_override::<IpAddr>(ENV_BIND_ADDRESS)? {
            self.bind_address = addr;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.blue_port == 0 || self.green_port == 0 {
            return Err(Error::InvalidConfig("ports must be non-zero".to_string()));
        }

        if self.blue_port == self.green_port {
            return Err(Error::InvalidConfig(format!(
                "blue and green must use distinct ports (both are {})",
                self.blue_port
            )));
        }

        if !self.healthcheck.path.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "healthcheck path must start with '/': {}",
                self.healthcheck.path
            )));
        }

        if self.healthcheck.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "healthcheck timeout must be non-zero".to_string(),
            ));
        }

        if self.healthcheck.retries == 0 {
            return Err(Error::InvalidConfig(
                "healthcheck retries must be at least 1".to_string(),
            ));
        }

        if self.monitor.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "monitor interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn port(&self, color: Color) -> u16 {
        match color {
            Color::Blue => self.blue_port,
            Color::Green => self.green_port,
        }
    }

    pub fn template() -> Self {
        Config {
            blue_port: default_blue_port(),
            green_port: default_green_port(),
            bind_address: default_bind_address(),
            healthcheck: HealthcheckConfig::default(),
            monitor: MonitorConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

fn env_override<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidEnvVar {
                name: name.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
