// ABOUTME: HTTP health probe for deployment environments.
// ABOUTME: Issues one bounded GET and maps every outcome to healthy or unhealthy.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::Empty;
use hyper::Request;
use hyper::header::{HOST, USER_AGENT};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::HealthcheckConfig;
use crate::types::HealthStatus;

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: HealthStatus,
    /// HTTP status code, if a response arrived.
    pub http_status: Option<u16>,
    pub elapsed: Duration,
}

/// Probes `GET http://{host}:{port}{path}` with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    host: IpAddr,
    path: String,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(host: IpAddr, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host,
            path: path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &HealthcheckConfig) -> Self {
        Self::new(config.host, config.path.clone(), config.timeout)
    }

    /// Probe the given port. Never fails; errors become `Unhealthy`.
    pub async fn probe(&self, port: u16) -> ProbeReport {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.request(port)).await;
        let elapsed = start.elapsed();

        let http_status = match outcome {
            Ok(Ok(code)) => Some(code),
            Ok(Err(reason)) => {
                debug!(port, %reason, "health probe failed");
                None
            }
            Err(_) => {
                debug!(port, timeout = ?self.timeout, "health probe timed out");
                None
            }
        };

        let status = match http_status {
            Some(code) if (200..300).contains(&code) => HealthStatus::Healthy,
            _ => HealthStatus::Unhealthy,
        };

        ProbeReport {
            status,
            http_status,
            elapsed,
        }
    }

    async fn request(&self, port: u16) -> Result<u16, String> {
        let authority = format!("{}:{}", self.host, port);
        let stream = TcpStream::connect((self.host, port))
            .await
            .map_err(|e| format!("connect to {authority}: {e}"))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| format!("handshake with {authority}: {e}"))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = Request::get(self.path.as_str())
            .header(HOST, authority.as_str())
            .header(USER_AGENT, concat!("bluegreen/", env!("CARGO_PKG_VERSION")))
            .body(Empty::<Bytes>::new())
            .map_err(|e| format!("build request: {e}"))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| format!("request to {authority}: {e}"))?;

        let code = resp.status().as_u16();
        if !resp.status().is_success() {
            debug!(status = code, %authority, "health probe non-2xx");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn closed_port_is_unhealthy() {
        // Bind then drop to find a port with nothing listening.
        let listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = HealthProbe::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            "/health",
            Duration::from_secs(1),
        );
        let report = probe.probe(port).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.http_status.is_none());
    }

    #[tokio::test]
    async fn silent_server_times_out_as_unhealthy() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        let hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let probe = HealthProbe::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            "/health",
            Duration::from_millis(200),
        );
        let report = probe.probe(port).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.elapsed >= Duration::from_millis(200));
        hold.abort();
    }
}
