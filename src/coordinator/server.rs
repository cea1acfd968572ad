// ABOUTME: HTTP server lifecycle for a single deployment environment.
// ABOUTME: Binds the listener, serves an Application, and drains connections on shutdown.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use snafu::{ResultExt, Snafu};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::{Color, Version};

/// Errors from the listener layer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ServerError {
    #[snafu(display("failed to bind {addr}: {source}"))]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[snafu(display("failed to read listener address: {source}"))]
    LocalAddr { source: std::io::Error },

    #[snafu(display("server task failed: {source}"))]
    Join { source: tokio::task::JoinError },

    #[snafu(display("connections did not drain within {}s", timeout.as_secs_f64()))]
    ShutdownTimeout { timeout: Duration },
}

/// A server application that can be bound to an environment's port.
#[async_trait]
pub trait Application: Send + Sync + 'static {
    async fn call(&self, req: Request<Incoming>) -> Response<Full<Bytes>>;
}

/// Handle to a running server. Owned by exactly one environment slot.
pub struct ServerHandle {
    local_addr: SocketAddr,
    started_at: DateTime<Utc>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("local_addr", &self.local_addr)
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl ServerHandle {
    /// Bind `addr` and start serving `app` in a background task.
    pub async fn bind(app: Arc<dyn Application>, addr: SocketAddr) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.context(BindSnafu { addr })?;
        let local_addr = listener.local_addr().context(LocalAddrSnafu)?;
        let (shutdown, rx) = watch::channel(false);

        let task = tokio::spawn(serve(listener, app, rx));
        debug!(%local_addr, "listener bound");

        Ok(Self {
            local_addr,
            started_at: Utc::now(),
            shutdown,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Stop accepting and wait for in-flight connections to finish.
    ///
    /// On timeout the handle stays usable and a later call resumes waiting.
    pub async fn shutdown(&mut self, timeout: Option<Duration>) -> Result<(), ServerError> {
        let _ = self.shutdown.send(true);

        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ServerError::ShutdownTimeout { timeout: limit })?,
            None => task.await,
        };

        self.task = None;
        joined.context(JoinSnafu)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn serve(
    listener: TcpListener,
    app: Arc<dyn Application>,
    mut shutdown: watch::Receiver<bool>,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        continue;
                    }
                };

                let app = Arc::clone(&app);
                let service = service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move { Ok::<_, Infallible>(app.call(req).await) }
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                let conn = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(error = %e, %peer, "connection closed with error");
                    }
                });
            }
            _ = shutdown.changed() => break,
        }
    }

    let addr = listener.local_addr().ok();
    drop(listener);
    graceful.shutdown().await;
    info!(addr = ?addr, "listener closed");
}

/// A minimal application answering `/health` with a configurable status.
///
/// The health response is JSON: `{"status": "...", "color": ..., "version": ...}`.
#[derive(Debug, Clone)]
pub struct StaticApp {
    color: Option<Color>,
    version: Option<Version>,
    health: Arc<AtomicU16>,
    delay: Duration,
}

/// Changes the status code a running `StaticApp` reports on `/health`.
#[derive(Debug, Clone)]
pub struct HealthControl(Arc<AtomicU16>);

impl HealthControl {
    pub fn set(&self, status: StatusCode) {
        self.0.store(status.as_u16(), Ordering::SeqCst);
    }
}

impl Default for StaticApp {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticApp {
    pub fn new() -> Self {
        Self {
            color: None,
            version: None,
            health: Arc::new(AtomicU16::new(StatusCode::OK.as_u16())),
            delay: Duration::ZERO,
        }
    }

    pub fn with_identity(mut self, color: Color, version: Option<Version>) -> Self {
        self.color = Some(color);
        self.version = version;
        self
    }

    pub fn with_health_status(self, status: StatusCode) -> Self {
        self.health.store(status.as_u16(), Ordering::SeqCst);
        self
    }

    /// Delay every `/health` response, e.g. to simulate a slow instance.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn health_control(&self) -> HealthControl {
        HealthControl(Arc::clone(&self.health))
    }

    fn health_response(&self) -> Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.health.load(Ordering::SeqCst))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": if status.is_success() { "ok" } else { "unavailable" },
            "color": self.color,
            "version": self.version,
        });

        let mut resp = Response::new(Full::new(Bytes::from(body.to_string())));
        *resp.status_mut() = status;
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        resp
    }
}

#[async_trait]
impl Application for StaticApp {
    async fn call(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        match (req.method(), req.uri().path()) {
            (&Method::GET, "/health") => {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.health_response()
            }
            (&Method::GET, "/") => {
                let banner = match (&self.color, &self.version) {
                    (Some(color), Some(version)) => format!("{color} {version}\n"),
                    (Some(color), None) => format!("{color}\n"),
                    _ => "ok\n".to_string(),
                };
                Response::new(Full::new(Bytes::from(banner)))
            }
            _ => {
                let mut resp = Response::new(Full::new(Bytes::from_static(b"not found\n")));
                *resp.status_mut() = StatusCode::NOT_FOUND;
                resp
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn bind_reports_local_address() {
        let mut handle = ServerHandle::bind(Arc::new(StaticApp::new()), loopback())
            .await
            .unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.shutdown(None).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_is_repeatable() {
        let mut handle = ServerHandle::bind(Arc::new(StaticApp::new()), loopback())
            .await
            .unwrap();
        handle.shutdown(None).await.unwrap();
        handle.shutdown(None).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_releases_port() {
        let mut handle = ServerHandle::bind(Arc::new(StaticApp::new()), loopback())
            .await
            .unwrap();
        let addr = handle.local_addr();
        handle.shutdown(Some(Duration::from_secs(5))).await.unwrap();

        let mut again = ServerHandle::bind(Arc::new(StaticApp::new()), addr)
            .await
            .expect("port should be free after shutdown");
        again.shutdown(None).await.unwrap();
    }

    #[tokio::test]
    async fn bind_fails_when_port_in_use() {
        let mut first = ServerHandle::bind(Arc::new(StaticApp::new()), loopback())
            .await
            .unwrap();
        let err = ServerHandle::bind(Arc::new(StaticApp::new()), first.local_addr())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        first.shutdown(None).await.unwrap();
    }
}
