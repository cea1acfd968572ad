// ABOUTME: Test support utilities.
// ABOUTME: Provides free ports, coordinators on loopback, and stub applications.

use std::net::{Ipv4Addr, TcpListener};
use std::sync::{Arc, Once};
use std::time::Duration;

use bluegreen::config::HealthcheckConfig;
use bluegreen::coordinator::{Application, Coordinator, CoordinatorSettings, StaticApp};
use bluegreen::types::Color;
use hyper::StatusCode;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("bluegreen=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Two distinct loopback ports with nothing listening on them.
#[allow(dead_code)]
pub fn free_ports() -> (u16, u16) {
    let a = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let b = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    (a.local_addr().unwrap().port(), b.local_addr().unwrap().port())
}

/// Probe settings tight enough for tests.
#[allow(dead_code)]
pub fn fast_healthcheck() -> HealthcheckConfig {
    HealthcheckConfig {
        timeout: Duration::from_millis(500),
        retries: 3,
        interval: Duration::from_millis(50),
        ..HealthcheckConfig::default()
    }
}

/// A coordinator on two free loopback ports.
#[allow(dead_code)]
pub fn coordinator() -> Arc<Coordinator> {
    coordinator_with_shutdown_timeout(Duration::from_secs(5))
}

/// A coordinator whose stops give up draining after `timeout`.
#[allow(dead_code)]
pub fn coordinator_with_shutdown_timeout(timeout: Duration) -> Arc<Coordinator> {
    init_tracing();
    let (blue, green) = free_ports();
    let settings = CoordinatorSettings::new(blue, green)
        .healthcheck(fast_healthcheck())
        .shutdown_timeout(timeout);
    Arc::new(Coordinator::new(settings).unwrap())
}

#[allow(dead_code)]
pub fn healthy_app(color: Color) -> Arc<dyn Application> {
    Arc::new(StaticApp::new().with_identity(color, None))
}

#[allow(dead_code)]
pub fn failing_app() -> Arc<dyn Application> {
    Arc::new(StaticApp::new().with_health_status(StatusCode::INTERNAL_SERVER_ERROR))
}
