// ABOUTME: Check command implementation.
// ABOUTME: Probes one environment's health endpoint and reports the result.

use bluegreen::config::Config;
use bluegreen::coordinator::HealthProbe;
use bluegreen::error::{Error, Result};
use bluegreen::output::Output;
use bluegreen::types::{Color, HealthStatus};

/// Probe a color's configured port, or an explicit port.
pub async fn check(config: &Config, target: &str, output: &Output) -> Result<()> {
    let (label, port) = resolve_target(config, target)?;
    let probe = HealthProbe::from_config(&config.healthcheck);

    output.progress(&format!(
        "  → Probing http://{}:{}{}...",
        config.healthcheck.host, port, config.healthcheck.path
    ));
    let report = probe.probe(port).await;

    let detail = match report.http_status {
        Some(code) => format!("HTTP {code} in {}ms", report.elapsed.as_millis()),
        None => format!("no response after {}ms", report.elapsed.as_millis()),
    };

    match report.status {
        HealthStatus::Healthy => {
            output.success(&format!("{label} is healthy ({detail})"));
            Ok(())
        }
        _ => Err(Error::Unhealthy(format!("{label} ({detail})"))),
    }
}

fn resolve_target(config: &Config, target: &str) -> Result<(String, u16)> {
    if let Ok(color) = target.parse::<Color>() {
        let port = config.port(color);
        return Ok((format!("{color} (port {port})"), port));
    }

    target
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .map(|port| (format!("port {port}"), port))
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "check target must be 'blue', 'green', or a port: {target}"
            ))
        })
}
