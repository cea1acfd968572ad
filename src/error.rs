// ABOUTME: Application-wide error types for bluegreen.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::coordinator::CoordinatorError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid value for environment variable {name}: {value:?}")]
    InvalidEnvVar { name: String, value: String },

    #[error("{0} is unhealthy")]
    Unhealthy(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
