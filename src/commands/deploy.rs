// ABOUTME: Deploy command implementation.
// ABOUTME: Bootstraps a coordinator, runs the deploy flow, and optionally monitors the result.

use std::sync::Arc;

use bluegreen::config::Config;
use bluegreen::coordinator::{
    Coordinator, CoordinatorSettings, HealthMonitor, MonitorOutcome, RolloutPolicy, StaticApp,
    deploy as run_deploy, teardown,
};
use bluegreen::diagnostics::{Diagnostics, Warning};
use bluegreen::error::{Error, Result};
use bluegreen::output::Output;
use bluegreen::types::Version;

pub struct DeployOptions {
    pub tag: Option<String>,
    pub keep_previous: bool,
    pub monitor: bool,
    pub hold: bool,
}

/// Start the baseline color, deploy a new version into the other, and switch.
pub async fn deploy(config: Config, options: DeployOptions, mut output: Output) -> Result<()> {
    output.start_timer();

    let version = match options.tag.as_deref() {
        Some(tag) => Version::new(tag).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => Version::timestamped(),
    };

    let coordinator = Arc::new(Coordinator::new(CoordinatorSettings::from(&config))?);
    let mut diag = Diagnostics::default();

    let baseline = coordinator.active_color();
    output.progress(&format!(
        "  → Starting baseline {} environment on port {}...",
        baseline,
        config.port(baseline)
    ));
    let baseline_app = StaticApp::new().with_identity(baseline, None);
    coordinator
        .start_environment(Arc::new(baseline_app), baseline, None)
        .await?;

    let target = baseline.other();
    output.progress(&format!(
        "  → Deploying {} to {} environment on port {}...",
        version,
        target,
        config.port(target)
    ));

    // The previous color is the rollback target while monitoring.
    let mut policy = RolloutPolicy::from_config(&config.healthcheck);
    if options.keep_previous || options.monitor {
        policy = policy.keep_previous();
    }

    let app = StaticApp::new().with_identity(target, Some(version.clone()));
    let result = run_deploy(&coordinator, Arc::new(app), version, &policy, &mut diag).await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            output.history(&coordinator.deployment_history());
            teardown(&coordinator, &mut diag).await;
            for warning in diag.warnings() {
                output.warning(&warning.message);
            }
            return Err(e.into());
        }
    };
    output.progress(&format!(
        "  ✓ Traffic switched to {} after {} health check(s)",
        report.color, report.attempts
    ));

    if options.monitor {
        output.progress(&format!(
            "  → Monitoring {} for {}s...",
            report.color,
            config.monitor.stabilization_period.as_secs()
        ));
        let outcome = HealthMonitor::new(Arc::clone(&coordinator), config.monitor.clone())
            .spawn()
            .wait()
            .await;

        match outcome {
            MonitorOutcome::Stable => {
                output.progress(&format!("  ✓ {} is stable", report.color));
                if !options.keep_previous
                    && let Err(e) = coordinator.stop_environment(report.previous).await
                {
                    diag.warn(Warning::previous_stop(
                        report.previous,
                        format!("failed to stop previous {} environment: {e}", report.previous),
                    ));
                }
            }
            MonitorOutcome::RolledBack { to } => {
                diag.warn(Warning::rolled_back(
                    to,
                    format!("{} failed monitoring, rolled back to {to}", report.color),
                ));
            }
            MonitorOutcome::RollbackFailed { reason } => {
                diag.warn(Warning::rollback_failed(
                    report.color,
                    format!("automatic rollback from {} failed: {reason}", report.color),
                ));
            }
            MonitorOutcome::Superseded | MonitorOutcome::Stopped => {}
        }
    }

    output.environments(
        &coordinator.active_environment(),
        &coordinator.inactive_environment(),
    );
    output.history(&coordinator.deployment_history());

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    if options.hold {
        output.progress(&format!(
            "  → Serving {} on port {} (Ctrl-C to stop)...",
            coordinator.active_color(),
            coordinator.active_environment().port
        ));
        tokio::signal::ctrl_c().await?;
    }

    coordinator.stop_all().await?;
    output.success("Deployment complete!");
    Ok(())
}
