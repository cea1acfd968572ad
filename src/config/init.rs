// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates bluegreen.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::template());
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"blue_port: {}
green_port: {}
bind_address: {}

healthcheck:
  path: {}
  timeout: {}
  retries: {}
  interval: {}

monitor:
  interval: {}
  max_errors: {}
  max_response_time: {}
  stabilization_period: {}

# shutdown:
#   timeout: 30s
"#,
        config.blue_port,
        config.green_port,
        config.bind_address,
        config.healthcheck.path,
        secs(config.healthcheck.timeout),
        config.healthcheck.retries,
        secs(config.healthcheck.interval),
        secs(config.monitor.interval),
        config.monitor.max_errors,
        secs(config.monitor.max_response_time),
        secs(config.monitor.stabilization_period),
    )
}

fn secs(duration: std::time::Duration) -> String {
    format!("{}s", duration.as_secs())
}
