// ABOUTME: Graceful shutdown configuration for environment servers.
// ABOUTME: An optional bound on how long stopping may wait for connections to drain.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShutdownConfig {
    /// Unset means wait for in-flight connections indefinitely.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}
